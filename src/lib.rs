pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod staging;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    BatchResult,
    BatchSummary,
    // Value objects
    BucketName,
    DerivativeOutcome,
    DerivativeReport,
    DerivativeTarget,
    FetchOutcome,
    InvocationError,
    KeyPathMapper,
    NotificationRecord,
    ObjectKey,
    PipelineResult,
    PresetRegistry,
    RecordResult,
    // Errors
    ResizeError,
    // Models
    ResizePreset,
    SkipReason,
    SourceObject,
    StorageError,
    StorageResult,
    ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{
    AcceptAll,
    // Service ports
    BatchService,
    ByteStream,
    CannedAcl,
    DerivativeService,
    EligibilityPredicate,
    // Storage and resize ports
    ObjectStoreGateway,
    ResizeOperation,
    StoreAck,
    StoreRequest,
};

// Service implementations - business logic
pub use services::{
    BatchProcessorImpl, DerivativePipelineBuilder, DerivativePipelineImpl, PipelineSettings,
};

// Application factory and configuration
pub use app::{
    AppBuilder, AppConfig, AppError, AppServices, EligibilityPolicy, ResizerBackend,
    StorageBackend, create_app_from_env, create_in_memory_app,
};

// Adapter types - infrastructure implementations
pub use adapters::inbound::{NotificationError, parse_s3_event};
pub use adapters::outbound::{
    eligibility::ImageExtensionEligibility,
    resize::{ConvertCommandResizer, ImageCrateResizer},
    storage::ApacheObjectStoreGateway,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        ApacheObjectStoreGateway, AppBuilder, AppServices, BatchService, BucketName,
        DerivativeService, KeyPathMapper, NotificationRecord, ObjectKey, ObjectStoreGateway,
        PresetRegistry, ResizeOperation, ResizePreset, create_in_memory_app, parse_s3_event,
    };
}
