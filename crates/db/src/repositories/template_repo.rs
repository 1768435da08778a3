//! Repository for the `email_templates` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::template::{CreateTemplate, EmailTemplate};

/// Column list for `email_templates` queries.
const COLUMNS: &str =
    "id, user_id, name, subject, body_html, body_text, created_at, updated_at";

/// Read and create operations for email templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Create a template owned by `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTemplate,
    ) -> Result<EmailTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_templates (user_id, name, subject, body_html, body_text) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.subject)
            .bind(&input.body_html)
            .bind(&input.body_text)
            .fetch_one(pool)
            .await
    }

    /// Find a template by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EmailTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_templates WHERE id = $1");
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
