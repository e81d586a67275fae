pub mod parity;

pub use parity::{DEFAULT_SYMBOLS_PER_DIMENSION, ParityCheckEngine, frame_checksum};
