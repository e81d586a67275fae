//! Concrete implementations of the ports: transports, the reference
//! error-correction engine, extractors, the local JSON endpoint and the
//! tracing observer.

pub mod channel;
pub mod engine;
pub mod extractor;
pub mod local;
pub mod observer;

pub use channel::{MAX_FRAME_LEN, MemoryChannel, StreamChannel, TcpConnector};
pub use engine::ParityCheckEngine;
pub use extractor::ToeplitzExtractor;
pub use local::JsonLineSource;
pub use observer::TracingObserver;
