//! Sent-message cross-reference model and DTO.

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sequence_emails` table: links a provider message to the
/// enrollment and step that produced it, with CRM attribution for
/// downstream record-linking.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SequenceEmail {
    pub id: DbId,
    pub enrollment_id: DbId,
    pub step_id: Option<DbId>,
    pub user_id: DbId,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub contact_email: String,
    pub subject: String,
    pub provider_message_id: String,
    pub sent_at: Timestamp,
}

/// DTO for recording a sent message.
#[derive(Debug)]
pub struct RecordSequenceEmail {
    pub enrollment_id: DbId,
    pub step_id: DbId,
    pub user_id: DbId,
    pub client_id: Option<DbId>,
    pub lead_id: Option<DbId>,
    pub contact_email: String,
    pub subject: String,
    pub provider_message_id: String,
}
