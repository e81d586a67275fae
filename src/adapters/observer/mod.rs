pub mod tracing;

pub use self::tracing::TracingObserver;
