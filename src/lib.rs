//! # Query Desk
//!
//! Upload documents or datasets, then ask free-text questions and get back
//! the closest matching record.
//!
//! Query Desk extracts a fixed set of fields (name, contact, keywords,
//! summary) from PDF, DOCX and text documents, loads rows from CSV and JSON
//! datasets, and keeps everything in one column-consistent knowledge store.
//! Questions are fuzzy-matched against the store; greetings are answered
//! directly and misses go to a fallback responder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌────────────┐
//! │  Uploads    │──▶│  Extract /  │──▶│  Knowledge │
//! │ PDF/DOCX/…  │   │  Dataset    │   │  store     │
//! └─────────────┘   └─────────────┘   └─────┬──────┘
//!                                           │
//!                                           ▼
//!                   ┌─────────────┐   ┌────────────┐
//!                   │  Fallback   │◀──│  Matcher   │◀── query
//!                   │  responder  │   │ (fuzzy)    │
//!                   └─────────────┘   └────────────┘
//! ```
//!
//! The store, matcher, field extractor and session log live in
//! `query-desk-core`. This crate adds file formats, persistence,
//! configuration and the `qdesk` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF/DOCX/text to plain text |
//! | [`dataset`] | CSV and JSON dataset loading |
//! | [`ingest`] | Uploads into the store |
//! | [`persist`] | Store file load/save |
//! | [`responder`] | Fallback replies for misses |
//! | [`chat`] | Question answering and sessions |
//! | [`export`] | Show and export the store |

pub mod chat;
pub mod config;
pub mod dataset;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod persist;
pub mod responder;
