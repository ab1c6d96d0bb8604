pub mod enricher;
pub mod summary_service;

pub use summary_service::{PipelineReport, SummaryService};
