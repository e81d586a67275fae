pub mod memory;
pub mod stream;

pub use memory::MemoryChannel;
pub use stream::{MAX_FRAME_LEN, StreamChannel, TcpConnector};
