//! Fallback replies for queries the knowledge store could not answer.
//!
//! A [`FallbackResponder`] is consulted only after the match engine returns
//! a miss. The shipped [`CannedResponder`] answers from configuration; a
//! responder backed by a generative model would implement the same trait.

use query_desk_core::NoMatchReason;

use crate::config::RepliesConfig;

pub trait FallbackResponder {
    /// Reply for `query`, which matched nothing for `reason`.
    fn respond(&self, query: &str, reason: NoMatchReason) -> String;
}

/// Fixed replies, one per miss reason.
#[derive(Debug, Clone)]
pub struct CannedResponder {
    fallback: String,
    empty_store: String,
}

impl CannedResponder {
    pub fn new(fallback: impl Into<String>, empty_store: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            empty_store: empty_store.into(),
        }
    }

    pub fn from_config(replies: &RepliesConfig) -> Self {
        Self::new(replies.fallback.clone(), replies.empty_store.clone())
    }
}

impl FallbackResponder for CannedResponder {
    fn respond(&self, _query: &str, reason: NoMatchReason) -> String {
        match reason {
            NoMatchReason::EmptyStore => self.empty_store.clone(),
            NoMatchReason::BelowThreshold { .. } => self.fallback.clone(),
        }
    }
}
