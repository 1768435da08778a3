//! Sequence step entity model and DTOs.

use cadence_core::content::StepContent;
use cadence_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `sequence_steps` table: one stage of a sequence.
///
/// `step_order` is unique within the sequence and defines the step index;
/// `delay_hours` is the wait after the previous step before this one fires.
/// Content may be literal (`subject`/`body_html`/`body_text`), come from the
/// referenced template, or mix both (see `cadence_core::content::resolve`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SequenceStep {
    pub id: DbId,
    pub sequence_id: DbId,
    pub step_order: i32,
    pub delay_hours: i32,
    pub template_id: Option<DbId>,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SequenceStep {
    /// The step's literal content fields, for resolution against a template.
    pub fn content(&self) -> StepContent {
        StepContent {
            subject: self.subject.clone(),
            body_html: self.body_html.clone(),
            body_text: self.body_text.clone(),
        }
    }
}

/// DTO for adding a step to a sequence.
#[derive(Debug, Deserialize)]
pub struct CreateStep {
    pub step_order: i32,
    pub delay_hours: i32,
    pub template_id: Option<DbId>,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}
