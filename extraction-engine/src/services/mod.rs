//! Extraction services: the hybrid pipeline, fallback providers, batch
//! worker pool, and metrics.

pub mod batch;
pub mod metrics;
pub mod pipeline;
pub mod providers;

pub use batch::BatchProcessor;
pub use pipeline::ExtractionPipeline;
pub use providers::{
    FallbackExtractor, FallbackOutcome, FallbackRequest, ProviderError, TransactionDraft,
};
