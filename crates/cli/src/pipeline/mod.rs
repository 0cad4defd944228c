//! Pipeline orchestration module.

mod orchestrator;
mod source;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use source::SampleSource;
pub use stats::PipelineStats;
