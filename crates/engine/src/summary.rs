//! Run summary returned by each batch invocation.

use cadence_core::types::DbId;
use serde::Serialize;

/// One failed enrollment within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentError {
    pub enrollment_id: DbId,
    pub error: String,
}

/// Aggregate result of one batch run, shaped for logging and alerting.
///
/// `sent` counts enrollments whose delivery attempt succeeded, whether or
/// not the sequence finished. `completed` counts enrollments that reached
/// the end of their sequence this run — the delivered subset plus any
/// closed out by the stale-schedule entry check. A scheduler is expected to
/// alert on a nonzero `failed` count.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub sent: usize,
    pub completed: usize,
    pub failed: usize,
    pub errors: Vec<EnrollmentError>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_summary_is_empty() {
        let summary = RunSummary::default();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.errors.is_empty());
    }
}
