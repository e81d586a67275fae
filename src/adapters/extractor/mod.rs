pub mod toeplitz;

pub use toeplitz::ToeplitzExtractor;
