//! Sequence entity model and DTOs.

use cadence_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `sequences` table: an ordered campaign definition owned
/// by one user. Treated as immutable once any enrollment references it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sequence {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a sequence.
#[derive(Debug, Deserialize)]
pub struct CreateSequence {
    pub name: String,
}
