pub mod bits;
pub mod cbor;

pub use cbor::CodecError;
