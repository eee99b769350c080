pub mod eligibility;
pub mod resize;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use eligibility::{AcceptAll, EligibilityPredicate};
pub use resize::ResizeOperation;
pub use services::{BatchService, DerivativeService};
pub use storage::{ByteStream, CannedAcl, ObjectStoreGateway, StoreAck, StoreRequest};
