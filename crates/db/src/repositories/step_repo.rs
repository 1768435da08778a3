//! Repository for the `sequence_steps` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::step::{CreateStep, SequenceStep};

/// Column list for `sequence_steps` queries.
const COLUMNS: &str = "\
    id, sequence_id, step_order, delay_hours, template_id, \
    subject, body_html, body_text, created_at, updated_at";

/// Read and create operations for sequence steps.
pub struct StepRepo;

impl StepRepo {
    /// Add a step to a sequence.
    pub async fn create(
        pool: &PgPool,
        sequence_id: DbId,
        input: &CreateStep,
    ) -> Result<SequenceStep, sqlx::Error> {
        let query = format!(
            "INSERT INTO sequence_steps \
                 (sequence_id, step_order, delay_hours, template_id, subject, body_html, body_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SequenceStep>(&query)
            .bind(sequence_id)
            .bind(input.step_order)
            .bind(input.delay_hours)
            .bind(input.template_id)
            .bind(&input.subject)
            .bind(&input.body_html)
            .bind(&input.body_text)
            .fetch_one(pool)
            .await
    }

    /// All steps of a sequence, ordered by step position ascending.
    ///
    /// Returns an empty list (not an error) when the sequence has no steps;
    /// callers treat that as "no content available".
    pub async fn list_for_sequence(
        pool: &PgPool,
        sequence_id: DbId,
    ) -> Result<Vec<SequenceStep>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sequence_steps \
             WHERE sequence_id = $1 \
             ORDER BY step_order ASC"
        );
        sqlx::query_as::<_, SequenceStep>(&query)
            .bind(sequence_id)
            .fetch_all(pool)
            .await
    }
}
