//! Repository for the `sequence_enrollments` table.
//!
//! The engine is the only writer of these rows during normal operation.
//! Every state write ends the current processing attempt by clearing the
//! `claimed_at` lease, so a row can never be stuck claimed after its
//! attempt finished.

use cadence_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::enrollment::{CreateEnrollment, SequenceEnrollment};
use crate::models::status::{EnrollmentStatus, StatusId};

/// Column list for `sequence_enrollments` queries.
const COLUMNS: &str = "\
    id, user_id, sequence_id, contact_email, client_id, lead_id, \
    current_step, status_id, last_email_sent_at, next_email_scheduled_at, \
    claimed_at, consecutive_failures, created_at, updated_at";

/// Default cap on rows claimed per batch run.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct FailureRecord {
    pub consecutive_failures: i32,
    pub status_id: StatusId,
}

/// State reads and writes for sequence enrollments.
pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Enroll a contact. Starts at step 0, active, scheduled at `start_at`
    /// (or immediately due when `start_at` is `None`).
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateEnrollment,
    ) -> Result<SequenceEnrollment, sqlx::Error> {
        let query = format!(
            "INSERT INTO sequence_enrollments \
                 (user_id, sequence_id, contact_email, client_id, lead_id, \
                  status_id, next_email_scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW())) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SequenceEnrollment>(&query)
            .bind(user_id)
            .bind(input.sequence_id)
            .bind(&input.contact_email)
            .bind(input.client_id)
            .bind(input.lead_id)
            .bind(EnrollmentStatus::Active.id())
            .bind(input.start_at)
            .fetch_one(pool)
            .await
    }

    /// Find an enrollment by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SequenceEnrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sequence_enrollments WHERE id = $1");
        sqlx::query_as::<_, SequenceEnrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim up to `limit` due enrollments for processing.
    ///
    /// Due means active, scheduled, and `next_email_scheduled_at <= NOW()`.
    /// Claiming stamps `claimed_at` inside a `FOR UPDATE SKIP LOCKED`
    /// selection, so two overlapping batch runs can never both claim the
    /// same row. A row whose lease is older than `lease_secs` counts as
    /// abandoned (a crashed run) and becomes claimable again.
    ///
    /// Results are ordered by scheduled time ascending, ties by id, to keep
    /// batch composition deterministic.
    pub async fn claim_due(
        pool: &PgPool,
        limit: i64,
        lease_secs: f64,
    ) -> Result<Vec<SequenceEnrollment>, sqlx::Error> {
        let query = format!(
            "WITH due AS ( \
                 SELECT id FROM sequence_enrollments \
                 WHERE status_id = $1 \
                   AND next_email_scheduled_at IS NOT NULL \
                   AND next_email_scheduled_at <= NOW() \
                   AND (claimed_at IS NULL OR claimed_at < NOW() - make_interval(secs => $2)) \
                 ORDER BY next_email_scheduled_at ASC, id ASC \
                 LIMIT $3 \
                 FOR UPDATE SKIP LOCKED \
             ), claimed AS ( \
                 UPDATE sequence_enrollments e \
                 SET claimed_at = NOW(), updated_at = NOW() \
                 FROM due \
                 WHERE e.id = due.id \
                 RETURNING e.* \
             ) \
             SELECT {COLUMNS} FROM claimed \
             ORDER BY next_email_scheduled_at ASC, id ASC"
        );
        sqlx::query_as::<_, SequenceEnrollment>(&query)
            .bind(EnrollmentStatus::Active.id())
            .bind(lease_secs)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Persist a successful mid-sequence delivery: move to `next_step`,
    /// schedule it, stamp the send, reset the failure streak, and release
    /// the claim.
    pub async fn advance_after_send(
        pool: &PgPool,
        id: DbId,
        next_step: i32,
        next_scheduled_at: Timestamp,
        sent_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sequence_enrollments \
             SET current_step = $2, next_email_scheduled_at = $3, \
                 last_email_sent_at = $4, consecutive_failures = 0, \
                 claimed_at = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_step)
        .bind(next_scheduled_at)
        .bind(sent_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Persist sequence exhaustion: status becomes `Completed` and the
    /// schedule is cleared. `sent_at` is `Some` when the final step was
    /// delivered on this attempt, `None` for the stale-schedule entry check
    /// (nothing sent, existing `last_email_sent_at` kept).
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        sent_at: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sequence_enrollments \
             SET status_id = $2, next_email_scheduled_at = NULL, \
                 last_email_sent_at = COALESCE($3, last_email_sent_at), \
                 consecutive_failures = 0, claimed_at = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(EnrollmentStatus::Completed.id())
        .bind(sent_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt: bump the failure streak and release the
    /// claim, leaving step, status, and schedule untouched so the row is
    /// retried on a later run. When the streak reaches `max_failures` the
    /// enrollment is parked in the terminal `Failed` status instead and its
    /// schedule cleared.
    pub async fn record_failure(
        pool: &PgPool,
        id: DbId,
        max_failures: i32,
    ) -> Result<FailureRecord, sqlx::Error> {
        sqlx::query_as::<_, FailureRecord>(
            "UPDATE sequence_enrollments \
             SET consecutive_failures = consecutive_failures + 1, \
                 status_id = CASE \
                     WHEN consecutive_failures + 1 >= $2 THEN $3 ELSE status_id END, \
                 next_email_scheduled_at = CASE \
                     WHEN consecutive_failures + 1 >= $2 THEN NULL \
                     ELSE next_email_scheduled_at END, \
                 claimed_at = NULL, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING consecutive_failures, status_id",
        )
        .bind(id)
        .bind(max_failures)
        .bind(EnrollmentStatus::Failed.id())
        .fetch_one(pool)
        .await
    }

    /// Cancel an active enrollment (external flows: contact replied or
    /// unsubscribed). Returns `false` when the enrollment was not active.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sequence_enrollments \
             SET status_id = $2, next_email_scheduled_at = NULL, \
                 claimed_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(EnrollmentStatus::Cancelled.id())
        .bind(EnrollmentStatus::Active.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
