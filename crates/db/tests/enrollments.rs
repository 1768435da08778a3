//! Integration tests for the enrollment repository.
//!
//! Exercises the claim/lease protocol and the state writes against a real
//! database:
//! - due selection (status, schedule, cap, deterministic order)
//! - claim exclusivity and lease expiry
//! - advance / complete / failure-streak / cancel writes

use chrono::{Duration, Utc};
use sqlx::PgPool;

use cadence_db::models::enrollment::CreateEnrollment;
use cadence_db::models::sequence::CreateSequence;
use cadence_db::models::status::EnrollmentStatus;
use cadence_db::repositories::{EnrollmentRepo, SequenceRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_sequence(pool: &PgPool, user_id: i64) -> i64 {
    SequenceRepo::create(
        pool,
        user_id,
        &CreateSequence {
            name: "Onboarding".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Enroll a contact already due `hours_ago` hours in the past.
async fn enroll_due(
    pool: &PgPool,
    user_id: i64,
    sequence_id: i64,
    email: &str,
    hours_ago: i64,
) -> i64 {
    EnrollmentRepo::create(
        pool,
        user_id,
        &CreateEnrollment {
            sequence_id,
            contact_email: email.to_string(),
            client_id: None,
            lead_id: None,
            start_at: Some(Utc::now() - Duration::hours(hours_ago)),
        },
    )
    .await
    .unwrap()
    .id
}

/// Postgres stores timestamps at microsecond precision, so a value that
/// round-tripped through the database can differ from the original by a
/// sub-millisecond truncation.
fn assert_close(actual: chrono::DateTime<Utc>, expected: chrono::DateTime<Utc>) {
    let drift = (actual - expected).num_milliseconds().abs();
    assert!(drift < 5, "timestamps differ by {drift}ms");
}

/// Push a claim into the past so the lease reads as expired.
async fn expire_claim(pool: &PgPool, id: i64) {
    sqlx::query(
        "UPDATE sequence_enrollments \
         SET claimed_at = NOW() - INTERVAL '15 minutes' WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await
    .unwrap();
}

const LEASE: f64 = 600.0;

// ---------------------------------------------------------------------------
// Creation defaults
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_starts_at_step_zero_active(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;

    let enrollment = EnrollmentRepo::create(
        &pool,
        user_id,
        &CreateEnrollment {
            sequence_id,
            contact_email: "lead@example.com".to_string(),
            client_id: None,
            lead_id: None,
            start_at: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(enrollment.current_step, 0);
    assert_eq!(enrollment.status_id, EnrollmentStatus::Active.id());
    assert!(enrollment.next_email_scheduled_at.is_some());
    assert!(enrollment.last_email_sent_at.is_none());
    assert!(enrollment.claimed_at.is_none());
    assert_eq!(enrollment.consecutive_failures, 0);
}

// ---------------------------------------------------------------------------
// Due selection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_due_skips_non_due_rows(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;

    let due = enroll_due(&pool, user_id, sequence_id, "due@example.com", 1).await;
    let cancelled = enroll_due(&pool, user_id, sequence_id, "cancelled@example.com", 1).await;
    let completed = enroll_due(&pool, user_id, sequence_id, "completed@example.com", 1).await;
    let unscheduled = enroll_due(&pool, user_id, sequence_id, "unsched@example.com", 1).await;

    // Future enrollment: not yet due.
    EnrollmentRepo::create(
        &pool,
        user_id,
        &CreateEnrollment {
            sequence_id,
            contact_email: "future@example.com".to_string(),
            client_id: None,
            lead_id: None,
            start_at: Some(Utc::now() + Duration::hours(4)),
        },
    )
    .await
    .unwrap();

    assert!(EnrollmentRepo::cancel(&pool, cancelled).await.unwrap());
    EnrollmentRepo::complete(&pool, completed, None).await.unwrap();
    sqlx::query("UPDATE sequence_enrollments SET next_email_scheduled_at = NULL WHERE id = $1")
        .bind(unscheduled)
        .execute(&pool)
        .await
        .unwrap();

    let claimed = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    let ids: Vec<i64> = claimed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![due]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_due_caps_batch_and_orders_by_schedule(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;

    let third = enroll_due(&pool, user_id, sequence_id, "c@example.com", 1).await;
    let first = enroll_due(&pool, user_id, sequence_id, "a@example.com", 9).await;
    let second = enroll_due(&pool, user_id, sequence_id, "b@example.com", 5).await;

    // Oldest-scheduled first, capped at two.
    let claimed = EnrollmentRepo::claim_due(&pool, 2, LEASE).await.unwrap();
    let ids: Vec<i64> = claimed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![first, second]);

    // The remaining row is still claimable by a later run.
    let rest = EnrollmentRepo::claim_due(&pool, 2, LEASE).await.unwrap();
    let ids: Vec<i64> = rest.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![third]);
}

// ---------------------------------------------------------------------------
// Claim exclusivity and lease expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn claimed_row_is_not_claimable_again(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    let first = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, id);
    assert!(first[0].claimed_at.is_some());

    let second = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert!(second.is_empty(), "live claim must not be handed out twice");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_lease_is_claimable_again(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    let first = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert_eq!(first.len(), 1);

    // Simulate a crashed run whose lease has lapsed.
    expire_claim(&pool, id).await;

    let second = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, id);
}

// ---------------------------------------------------------------------------
// State writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn advance_after_send_moves_to_next_step(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();

    let sent_at = Utc::now();
    let next_at = sent_at + Duration::hours(24);
    EnrollmentRepo::advance_after_send(&pool, id, 1, next_at, sent_at)
        .await
        .unwrap();

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.current_step, 1);
    assert_eq!(row.status_id, EnrollmentStatus::Active.id());
    assert_close(row.next_email_scheduled_at.unwrap(), next_at);
    assert_close(row.last_email_sent_at.unwrap(), sent_at);
    assert!(row.claimed_at.is_none(), "state write must release the claim");
    assert_eq!(row.consecutive_failures, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_clears_schedule_and_claim(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    let sent_at = Utc::now();
    EnrollmentRepo::complete(&pool, id, Some(sent_at)).await.unwrap();

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.status_id, EnrollmentStatus::Completed.id());
    assert!(row.next_email_scheduled_at.is_none());
    assert_close(row.last_email_sent_at.unwrap(), sent_at);
    assert!(row.claimed_at.is_none());

    let claimed = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert!(claimed.is_empty(), "completed enrollments are never due");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_without_send_keeps_last_sent(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    let sent_at = Utc::now() - Duration::hours(24);
    EnrollmentRepo::advance_after_send(&pool, id, 1, Utc::now(), sent_at)
        .await
        .unwrap();

    // Entry-check completion: nothing was sent on this attempt.
    EnrollmentRepo::complete(&pool, id, None).await.unwrap();

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.status_id, EnrollmentStatus::Completed.id());
    assert_close(row.last_email_sent_at.unwrap(), sent_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn record_failure_bumps_streak_and_releases_claim(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    let before = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    let scheduled_at = before[0].next_email_scheduled_at;

    let record = EnrollmentRepo::record_failure(&pool, id, 5).await.unwrap();
    assert_eq!(record.consecutive_failures, 1);
    assert_eq!(record.status_id, EnrollmentStatus::Active.id());

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.current_step, 0, "failure must not advance the step");
    assert_eq!(row.next_email_scheduled_at, scheduled_at);
    assert!(row.claimed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_streak_parks_enrollment_as_failed(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    for expected in 1..=4 {
        let record = EnrollmentRepo::record_failure(&pool, id, 5).await.unwrap();
        assert_eq!(record.consecutive_failures, expected);
        assert_eq!(record.status_id, EnrollmentStatus::Active.id());
    }

    let record = EnrollmentRepo::record_failure(&pool, id, 5).await.unwrap();
    assert_eq!(record.consecutive_failures, 5);
    assert_eq!(record.status_id, EnrollmentStatus::Failed.id());

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(row.next_email_scheduled_at.is_none());

    let claimed = EnrollmentRepo::claim_due(&pool, 50, LEASE).await.unwrap();
    assert!(claimed.is_empty(), "failed enrollments are never due");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_only_affects_active_rows(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let sequence_id = seed_sequence(&pool, user_id).await;
    let id = enroll_due(&pool, user_id, sequence_id, "lead@example.com", 1).await;

    assert!(EnrollmentRepo::cancel(&pool, id).await.unwrap());
    assert!(!EnrollmentRepo::cancel(&pool, id).await.unwrap());

    let row = EnrollmentRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(row.status_id, EnrollmentStatus::Cancelled.id());
    assert!(row.next_email_scheduled_at.is_none());
}
