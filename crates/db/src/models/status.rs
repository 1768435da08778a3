//! Enrollment status enum mapping to the seeded `enrollment_statuses` table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Enrollment lifecycle status. Discriminants match the seed data order
/// (1-based) in `enrollment_statuses`.
///
/// `Active` and `Completed` are the two states the engine moves between.
/// `Cancelled` is set by external flows (contact replied, unsubscribed) and
/// is never entered by the engine itself. `Failed` is the dead-letter state
/// entered after too many consecutive processing failures.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Active = 1,
    Completed = 2,
    Cancelled = 3,
    Failed = 4,
}

impl EnrollmentStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a raw status ID back to the enum, if known.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(EnrollmentStatus::Active),
            2 => Some(EnrollmentStatus::Completed),
            3 => Some(EnrollmentStatus::Cancelled),
            4 => Some(EnrollmentStatus::Failed),
            _ => None,
        }
    }

    /// Human-readable name, matching the `enrollment_statuses.name` column.
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Failed => "failed",
        }
    }
}

impl From<EnrollmentStatus> for StatusId {
    fn from(value: EnrollmentStatus) -> Self {
        value as StatusId
    }
}
