//! Enrollment progression state machine.
//!
//! Computes the next persisted state for one enrollment from the delivery
//! outcome of its current step. Pure: callers pass the step delays and the
//! current wall-clock time, and persist the returned [`Transition`].
//!
//! Scheduling convention: the next step's delay is anchored to `now` (the
//! time the current attempt finished), not to the previous scheduled or sent
//! time. A backlogged batch therefore drifts forward rather than compressing
//! the gap between steps.

use chrono::Duration;

use crate::types::Timestamp;

/// Consecutive failed attempts after which an enrollment is parked in the
/// terminal `Failed` status instead of being retried forever.
pub const MAX_CONSECUTIVE_FAILURES: i32 = 5;

/// Outcome of the delivery attempt for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed,
}

/// The state change to persist for one processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The sequence is exhausted. Status becomes `Completed` and the
    /// schedule is cleared. `sent_at` is `Some` when this attempt delivered
    /// the final step, `None` when the enrollment was already past the end
    /// (stale schedule) and nothing was sent.
    Complete { sent_at: Option<Timestamp> },
    /// Delivery succeeded and more steps remain: move to `next_step` and
    /// schedule it `delay_hours(next_step)` after `now`.
    Advance {
        next_step: i32,
        next_scheduled_at: Timestamp,
        sent_at: Timestamp,
    },
    /// The attempt failed. No enrollment field changes; the row stays due
    /// and is retried on a later run.
    Unchanged,
}

/// Compute the transition for an enrollment at `current_step` of a sequence
/// whose per-step delays (in hours, ordered by step) are `step_delays`.
///
/// The entry check runs before any delivery concern: an enrollment already
/// indexed past the end of the sequence completes immediately, guarding
/// against stale schedules left by step-list edits.
pub fn advance(
    current_step: i32,
    step_delays: &[i32],
    outcome: DeliveryOutcome,
    now: Timestamp,
) -> Transition {
    let step_count = step_delays.len() as i32;

    if current_step >= step_count {
        return Transition::Complete { sent_at: None };
    }

    match outcome {
        DeliveryOutcome::Failed => Transition::Unchanged,
        DeliveryOutcome::Delivered => {
            let next_step = current_step + 1;
            if next_step >= step_count {
                Transition::Complete { sent_at: Some(now) }
            } else {
                let delay = step_delays[next_step as usize];
                Transition::Advance {
                    next_step,
                    next_scheduled_at: now + Duration::hours(delay as i64),
                    sent_at: now,
                }
            }
        }
    }
}

/// Whether a failure count has crossed the dead-letter threshold.
pub fn exhausted_retries(consecutive_failures: i32) -> bool {
    consecutive_failures >= MAX_CONSECUTIVE_FAILURES
}
