pub mod frame;
pub mod messages;
pub mod params;

pub use frame::{
    DiscardFlag, DiscardSummary, Frame, FrameChecksum, assemble_reconciled_key, flatten_frames,
};
pub use messages::{
    ChannelMessage, ErrorReport, NormalizationVector, ReconciliationDiscardFlags,
    ReconciliationInit, ReconciliationVerification, Syndrome,
};
pub use params::{Beta, MdrDimension, SignalToNoiseRatio};
