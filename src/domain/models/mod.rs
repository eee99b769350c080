pub mod derivative;
pub mod notification;
pub mod outcome;
pub mod preset;
pub mod source_object;

pub use derivative::{DerivativeOutcome, DerivativeReport, DerivativeTarget};
pub use notification::NotificationRecord;
pub use outcome::{
    BatchResult, BatchSummary, FetchOutcome, InvocationError, PipelineResult, RecordResult,
    SkipReason,
};
pub use preset::{PresetRegistry, ResizePreset};
pub use source_object::{KeyPathMapper, SourceObject};
