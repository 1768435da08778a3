//! The batch orchestrator.
//!
//! Each run claims a batch of due enrollments and pushes every one through
//! the pipeline: read steps → entry check → resolve content → deliver →
//! persist the transition → record the sent-message cross-reference. A
//! failure in one enrollment is caught at the loop boundary and never
//! stops the rest of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use sqlx::PgPool;

use cadence_core::content;
use cadence_core::error::CoreError;
use cadence_core::progression::{self, DeliveryOutcome, Transition};
use cadence_core::types::DbId;
use cadence_db::models::enrollment::SequenceEnrollment;
use cadence_db::models::message::RecordSequenceEmail;
use cadence_db::models::status::EnrollmentStatus;
use cadence_db::models::template::EmailTemplate;
use cadence_db::repositories::{EnrollmentRepo, SequenceEmailRepo, StepRepo, TemplateRepo};
use cadence_delivery::{Attribution, EmailGateway, GatewayError, SendRequest};

use crate::summary::{EnrollmentError, RunSummary};

/// Tunables for one processor instance.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum enrollments claimed per run.
    pub batch_size: i64,
    /// Bound on a single delivery call; expiry counts as a delivery failure.
    pub delivery_timeout: Duration,
    /// How long a claim stays live before an overlapping run may treat the
    /// row as abandoned and re-claim it.
    pub claim_lease: Duration,
    /// Consecutive failures after which an enrollment is parked as `Failed`.
    pub max_consecutive_failures: i32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: cadence_db::repositories::enrollment_repo::DEFAULT_BATCH_SIZE,
            delivery_timeout: Duration::from_secs(30),
            claim_lease: Duration::from_secs(600),
            max_consecutive_failures: progression::MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// A batch-level failure: no enrollments were processed, no partial summary.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Failed to claim due enrollments: {0}")]
    Selection(#[from] sqlx::Error),
}

/// Per-enrollment pipeline failures, each converted into one entry of the
/// run summary's `errors` list.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The enrollment's sequence has zero steps; nothing can be sent.
    #[error("Sequence {sequence_id} has no steps")]
    NoStepsFound { sequence_id: DbId },

    /// The step index missed the step list. The entry check makes this
    /// unreachable in practice; kept as a guard.
    #[error("Step index {index} out of range ({count} steps)")]
    StepNotFound { index: i32, count: usize },

    /// The step resolved to no usable subject/body.
    #[error(transparent)]
    NoContent(#[from] CoreError),

    /// The delivery gateway call errored.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] GatewayError),

    /// The delivery gateway call exceeded the configured bound.
    #[error("Delivery timed out after {0:?}")]
    DeliveryTimeout(Duration),

    /// A database read (or pre-send write) failed.
    #[error("Database operation failed: {0}")]
    Database(#[source] sqlx::Error),

    /// The state write after a successful delivery failed. The email went
    /// out but the enrollment was not advanced: the next run may send a
    /// duplicate once the claim lease expires. Logged distinctly for
    /// reconciliation.
    #[error("State write failed after successful delivery: {0}")]
    Persistence(#[source] sqlx::Error),
}

/// How one enrollment's attempt ended, from the summary's point of view.
enum Outcome {
    /// A delivery succeeded; `completed` when it was the final step.
    Delivered { completed: bool },
    /// The entry check closed out a stale enrollment without sending.
    AlreadyComplete,
}

/// Processes batches of due enrollments against one database and one
/// delivery gateway.
pub struct SequenceProcessor {
    pool: PgPool,
    gateway: Arc<dyn EmailGateway>,
    config: ProcessorConfig,
}

impl SequenceProcessor {
    /// Create a processor with default tunables.
    pub fn new(pool: PgPool, gateway: Arc<dyn EmailGateway>) -> Self {
        Self::with_config(pool, gateway, ProcessorConfig::default())
    }

    /// Create a processor with explicit tunables.
    pub fn with_config(
        pool: PgPool,
        gateway: Arc<dyn EmailGateway>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            pool,
            gateway,
            config,
        }
    }

    /// Claim and process one batch of due enrollments.
    ///
    /// Returns the aggregate [`RunSummary`]; only a failure of the claim
    /// query itself is fatal. Within one run enrollments are processed
    /// sequentially, each inside its own error boundary.
    pub async fn run_batch(&self) -> Result<RunSummary, BatchError> {
        let started = Instant::now();
        let claimed = EnrollmentRepo::claim_due(
            &self.pool,
            self.config.batch_size,
            self.config.claim_lease.as_secs_f64(),
        )
        .await?;

        let mut summary = RunSummary {
            total: claimed.len(),
            ..RunSummary::default()
        };

        tracing::info!(total = claimed.len(), "Sequence batch started");

        for enrollment in &claimed {
            match self.process_one(enrollment).await {
                Ok(Outcome::Delivered { completed }) => {
                    summary.sent += 1;
                    if completed {
                        summary.completed += 1;
                    }
                }
                Ok(Outcome::AlreadyComplete) => {
                    summary.completed += 1;
                }
                Err(error) => {
                    summary.failed += 1;
                    self.handle_failure(enrollment, &error).await;
                    summary.errors.push(EnrollmentError {
                        enrollment_id: enrollment.id,
                        error: error.to_string(),
                    });
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            completed = summary.completed,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "Sequence batch finished",
        );

        Ok(summary)
    }

    /// Run the full pipeline for one claimed enrollment.
    async fn process_one(
        &self,
        enrollment: &SequenceEnrollment,
    ) -> Result<Outcome, ProcessError> {
        let steps = StepRepo::list_for_sequence(&self.pool, enrollment.sequence_id)
            .await
            .map_err(ProcessError::Database)?;

        if steps.is_empty() {
            return Err(ProcessError::NoStepsFound {
                sequence_id: enrollment.sequence_id,
            });
        }

        // Entry check: a stale schedule pointing past the end of the
        // sequence completes immediately, with no delivery attempt.
        if enrollment.current_step as usize >= steps.len() {
            EnrollmentRepo::complete(&self.pool, enrollment.id, None)
                .await
                .map_err(ProcessError::Database)?;
            tracing::info!(
                enrollment_id = enrollment.id,
                current_step = enrollment.current_step,
                "Enrollment already past the last step; completed without delivery",
            );
            return Ok(Outcome::AlreadyComplete);
        }

        let step = steps
            .get(enrollment.current_step as usize)
            .ok_or(ProcessError::StepNotFound {
                index: enrollment.current_step,
                count: steps.len(),
            })?;

        let template = match step.template_id {
            Some(template_id) => {
                let found = TemplateRepo::find_by_id(&self.pool, template_id)
                    .await
                    .map_err(ProcessError::Database)?;
                if found.is_none() {
                    tracing::warn!(
                        step_id = step.id,
                        template_id,
                        "Step references a missing template; falling back to step literals",
                    );
                }
                found
            }
            None => None,
        };

        let template_content = template.as_ref().map(EmailTemplate::content);
        let resolved = content::resolve(&step.content(), template_content.as_ref())?;

        let request = SendRequest {
            to: enrollment.contact_email.clone(),
            subject: resolved.subject,
            html: resolved.html,
            text: resolved.text,
            attribution: Attribution {
                user_id: enrollment.user_id,
                client_id: enrollment.client_id,
                lead_id: enrollment.lead_id,
            },
        };

        let receipt =
            match tokio::time::timeout(self.config.delivery_timeout, self.gateway.send(&request))
                .await
            {
                Err(_) => return Err(ProcessError::DeliveryTimeout(self.config.delivery_timeout)),
                Ok(Err(error)) => return Err(ProcessError::Delivery(error)),
                Ok(Ok(receipt)) => receipt,
            };

        let delays: Vec<i32> = steps.iter().map(|s| s.delay_hours).collect();
        let now = Utc::now();
        let completed = match progression::advance(
            enrollment.current_step,
            &delays,
            DeliveryOutcome::Delivered,
            now,
        ) {
            Transition::Advance {
                next_step,
                next_scheduled_at,
                sent_at,
            } => {
                EnrollmentRepo::advance_after_send(
                    &self.pool,
                    enrollment.id,
                    next_step,
                    next_scheduled_at,
                    sent_at,
                )
                .await
                .map_err(ProcessError::Persistence)?;
                false
            }
            Transition::Complete { sent_at } => {
                EnrollmentRepo::complete(&self.pool, enrollment.id, sent_at)
                    .await
                    .map_err(ProcessError::Persistence)?;
                true
            }
            // A delivered outcome never maps to Unchanged.
            Transition::Unchanged => false,
        };

        // Best-effort cross-reference: the email is already out, so a
        // failed insert must not fail the attempt.
        let record = RecordSequenceEmail {
            enrollment_id: enrollment.id,
            step_id: step.id,
            user_id: enrollment.user_id,
            client_id: enrollment.client_id,
            lead_id: enrollment.lead_id,
            contact_email: request.to.clone(),
            subject: request.subject.clone(),
            provider_message_id: receipt.message_id.clone(),
        };
        if let Err(error) = SequenceEmailRepo::record(&self.pool, &record).await {
            tracing::warn!(
                enrollment_id = enrollment.id,
                error = %error,
                "Failed to record sent-message cross-reference",
            );
        }

        tracing::info!(
            enrollment_id = enrollment.id,
            step = enrollment.current_step,
            message_id = %receipt.message_id,
            completed,
            "Sequence email sent",
        );

        Ok(Outcome::Delivered { completed })
    }

    /// Record a failed attempt against the enrollment.
    ///
    /// Post-send persistence failures are the exception: the claim is left
    /// in place so the lease acts as a cooling-off period before the row
    /// can be retried, and the event is logged for reconciliation rather
    /// than counted against the failure streak.
    async fn handle_failure(&self, enrollment: &SequenceEnrollment, error: &ProcessError) {
        if let ProcessError::Persistence(source) = error {
            tracing::error!(
                enrollment_id = enrollment.id,
                error = %source,
                "Reconciliation required: email sent but state write failed; \
                 the enrollment may duplicate-send after its claim lease expires",
            );
            return;
        }

        tracing::warn!(
            enrollment_id = enrollment.id,
            error = %error,
            "Enrollment processing failed",
        );

        match EnrollmentRepo::record_failure(
            &self.pool,
            enrollment.id,
            self.config.max_consecutive_failures,
        )
        .await
        {
            Ok(record) if record.status_id == EnrollmentStatus::Failed.id() => {
                tracing::warn!(
                    enrollment_id = enrollment.id,
                    consecutive_failures = record.consecutive_failures,
                    "Enrollment parked as failed for manual review",
                );
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(
                    enrollment_id = enrollment.id,
                    error = %error,
                    "Failed to record the processing failure",
                );
            }
        }
    }
}
