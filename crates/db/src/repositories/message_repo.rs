//! Repository for the `sequence_emails` cross-reference table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{RecordSequenceEmail, SequenceEmail};

/// Column list for `sequence_emails` queries.
const COLUMNS: &str = "\
    id, enrollment_id, step_id, user_id, client_id, lead_id, \
    contact_email, subject, provider_message_id, sent_at";

/// Write and read operations for the sent-message log.
///
/// Inserts are best-effort from the engine's point of view: the email has
/// already gone out, so a failed insert is logged and swallowed rather than
/// failing the attempt.
pub struct SequenceEmailRepo;

impl SequenceEmailRepo {
    /// Record one sent message.
    pub async fn record(
        pool: &PgPool,
        input: &RecordSequenceEmail,
    ) -> Result<SequenceEmail, sqlx::Error> {
        let query = format!(
            "INSERT INTO sequence_emails \
                 (enrollment_id, step_id, user_id, client_id, lead_id, \
                  contact_email, subject, provider_message_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SequenceEmail>(&query)
            .bind(input.enrollment_id)
            .bind(input.step_id)
            .bind(input.user_id)
            .bind(input.client_id)
            .bind(input.lead_id)
            .bind(&input.contact_email)
            .bind(&input.subject)
            .bind(&input.provider_message_id)
            .fetch_one(pool)
            .await
    }

    /// All messages sent for one enrollment, oldest first.
    pub async fn list_for_enrollment(
        pool: &PgPool,
        enrollment_id: DbId,
    ) -> Result<Vec<SequenceEmail>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sequence_emails \
             WHERE enrollment_id = $1 \
             ORDER BY sent_at ASC, id ASC"
        );
        sqlx::query_as::<_, SequenceEmail>(&query)
            .bind(enrollment_id)
            .fetch_all(pool)
            .await
    }
}
