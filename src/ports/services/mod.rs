mod batch_service;
mod derivative_service;

pub use batch_service::BatchService;
pub use derivative_service::DerivativeService;
