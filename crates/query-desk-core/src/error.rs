//! Error types surfaced by the core.
//!
//! Only conditions the caller must react to live here. Extraction failures
//! are recovered inside [`crate::extract`], and "nothing matched" is a
//! [`crate::models::NoMatchReason`], not an error.

use thiserror::Error;

/// Errors raised by a [`crate::store::RecordStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record's column set differs from the store's schema.
    /// The store is left unchanged.
    #[error("schema mismatch: store has columns [{}], record has [{}]", .expected.join(", "), .found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Errors raised while building a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown role '{0}': expected 'user' or 'assistant'")]
    UnknownRole(String),
}
