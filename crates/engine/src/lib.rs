//! Batch engine: drives due enrollments through the resolve → deliver →
//! transition pipeline, isolating per-enrollment failures and aggregating
//! a run summary.

pub mod processor;
pub mod summary;

pub use processor::{BatchError, ProcessError, ProcessorConfig, SequenceProcessor};
pub use summary::{EnrollmentError, RunSummary};
