//! Pipeline module.
//!
//! This module provides the main insight pipeline and its progress and
//! cancellation plumbing.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineOutput};
pub use progress::{
    CancellationToken, ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
