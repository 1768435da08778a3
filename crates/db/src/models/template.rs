//! Email template entity model and DTOs.

use cadence_core::content::TemplateContent;
use cadence_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `email_templates` table: reusable content referenced by
/// zero or more sequence steps.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailTemplate {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EmailTemplate {
    /// The template's content fields, for step resolution.
    pub fn content(&self) -> TemplateContent {
        TemplateContent {
            subject: self.subject.clone(),
            body_html: self.body_html.clone(),
            body_text: self.body_text.clone(),
        }
    }
}

/// DTO for creating a template.
#[derive(Debug, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}
