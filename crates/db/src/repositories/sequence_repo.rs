//! Repository for the `sequences` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::sequence::{CreateSequence, Sequence};

/// Column list for `sequences` queries.
const COLUMNS: &str = "id, user_id, name, created_at, updated_at";

/// Read and create operations for sequence definitions.
pub struct SequenceRepo;

impl SequenceRepo {
    /// Create a sequence owned by `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateSequence,
    ) -> Result<Sequence, sqlx::Error> {
        let query = format!(
            "INSERT INTO sequences (user_id, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sequence>(&query)
            .bind(user_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a sequence by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Sequence>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sequences WHERE id = $1");
        sqlx::query_as::<_, Sequence>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's sequences, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Sequence>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM sequences WHERE user_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Sequence>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
