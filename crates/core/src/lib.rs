//! Pure domain logic for the sequence processing engine.
//!
//! This crate has zero internal deps so it can be used by the repository
//! layer, the batch engine, and any future CLI tooling. Everything here is
//! synchronous and side-effect free: content resolution and enrollment
//! progression are pure functions the engine composes with I/O.

pub mod content;
pub mod error;
pub mod progression;
pub mod types;

pub use error::CoreError;
