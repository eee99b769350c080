mod batch_processor_impl;
pub mod content_type;
mod derivative_pipeline_impl;

pub use batch_processor_impl::BatchProcessorImpl;
pub use content_type::sniff_content_type;
pub use derivative_pipeline_impl::{
    DerivativePipelineBuilder, DerivativePipelineImpl, PipelineSettings,
};
