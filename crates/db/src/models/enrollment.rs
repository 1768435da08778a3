//! Sequence enrollment entity model and DTOs.

use cadence_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `sequence_enrollments` table: one contact's mutable
/// progress through one sequence.
///
/// Only the engine mutates these rows during normal operation; external
/// cancellation flows may also flip `status_id`. `claimed_at` is the
/// processing lease stamped by the batch claim and cleared by the state
/// write that ends the attempt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SequenceEnrollment {
    pub id: DbId,
    pub user_id: DbId,
    pub sequence_id: DbId,
    pub contact_email: String,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub current_step: i32,
    pub status_id: StatusId,
    pub last_email_sent_at: Option<Timestamp>,
    pub next_email_scheduled_at: Option<Timestamp>,
    pub claimed_at: Option<Timestamp>,
    pub consecutive_failures: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for enrolling a contact into a sequence.
///
/// `start_at` is the first step's scheduled time; `None` means "due now".
#[derive(Debug, Deserialize)]
pub struct CreateEnrollment {
    pub sequence_id: DbId,
    pub contact_email: String,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub start_at: Option<Timestamp>,
}
