//! Error type shared by the pure domain modules.

/// Errors produced by domain-level resolution.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A step resolved to no usable content (empty subject, or both bodies
    /// empty). The enrollment must not be advanced.
    #[error("No usable content: {0}")]
    NoContent(String),
}
