//! # Query Desk Core
//!
//! Pure, synchronous logic for Query Desk: the record model, field
//! extraction from raw document text, the schema-checked knowledge store,
//! token-aware fuzzy similarity, the match engine, and the conversation
//! session log.
//!
//! This crate performs no filesystem or network I/O. Reading documents,
//! loading datasets, and persisting the store are the application crate's
//! job; it hands text and records in and renders the results that come out.
//!
//! ```text
//! raw text ──▶ extract ──▶ Record ──▶ InMemoryStore
//!                                          │
//! query ─────────────────────▶ Matcher ◀───┘
//!                                 │
//!                                 ▼
//!                           MatchResult ──▶ Session
//! ```

pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod session;
pub mod similarity;
pub mod store;

pub use error::{SessionError, StoreError};
pub use matcher::{MatchConfig, Matcher};
pub use models::{MatchResult, Matched, NoMatchReason, Record};
pub use session::{Role, Session, Turn};
pub use similarity::{Similarity, WeightedRatio};
pub use store::{memory::InMemoryStore, RecordStore};
