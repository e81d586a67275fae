pub mod bridge;
pub mod channel;
pub mod engine;
pub mod extractor;
pub mod observer;

pub use bridge::*;
pub use channel::*;
pub use engine::*;
pub use extractor::*;
pub use observer::*;
