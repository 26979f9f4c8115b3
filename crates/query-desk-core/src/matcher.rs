//! Match engine: resolve a free-text query to the best stored record.
//!
//! # Algorithm
//!
//! 1. Normalize the query (trim, lower-case). The caller's original text is
//!    never modified.
//! 2. Greetings (`hi`, `hello`, `hey`, `greetings`, `good morning`,
//!    `good evening`, `namaste`) short-circuit to a canned reply with score
//!    100, before the store is looked at.
//! 3. An empty store yields [`NoMatchReason::EmptyStore`].
//! 4. Each record is scored against the key column's value when it has
//!    that column. Otherwise every value is scored on its own and together
//!    with the others, and the best of those is the record's score.
//! 5. Highest score wins; on a tie the earliest-inserted record wins.
//! 6. Scores strictly above [`MATCH_THRESHOLD`] are hits. Anything else is
//!    [`NoMatchReason::BelowThreshold`].
//!
//! The result is a pure function of the query, the store contents, and the
//! matcher configuration.

use crate::models::{MatchResult, Matched, NoMatchReason, Record};
use crate::similarity::{Similarity, WeightedRatio};
use crate::store::RecordStore;

/// A hit needs a score strictly greater than this.
pub const MATCH_THRESHOLD: f64 = 60.0;

/// Normalized queries answered without a store lookup.
pub const GREETINGS: [&str; 7] = [
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good evening",
    "namaste",
];

pub const DEFAULT_KEY_COLUMN: &str = "Question";
pub const DEFAULT_GREETING_REPLY: &str = "Hello! How can I help you today?";

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Column whose value is compared against the query. `None`, or a
    /// record lacking the column, compares against the whole record.
    pub key_column: Option<String>,
    /// Reply carried by a greeting hit.
    pub greeting_reply: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            key_column: Some(DEFAULT_KEY_COLUMN.to_string()),
            greeting_reply: DEFAULT_GREETING_REPLY.to_string(),
        }
    }
}

pub struct Matcher {
    config: MatchConfig,
    similarity: Box<dyn Similarity>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl Matcher {
    /// A matcher scoring with [`WeightedRatio`].
    pub fn new(config: MatchConfig) -> Self {
        Self::with_similarity(config, WeightedRatio)
    }

    pub fn with_similarity(config: MatchConfig, similarity: impl Similarity + 'static) -> Self {
        Self {
            config,
            similarity: Box::new(similarity),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Match `query` against every record in `store`.
    pub fn match_query<S: RecordStore + ?Sized>(&self, query: &str, store: &S) -> MatchResult {
        let normalized = normalize(query);

        if is_greeting(&normalized) {
            return MatchResult::Hit {
                matched: Matched::Greeting {
                    reply: self.config.greeting_reply.clone(),
                },
                score: 100.0,
            };
        }

        let records = store.all();
        if records.is_empty() {
            return MatchResult::NoMatch {
                reason: NoMatchReason::EmptyStore,
            };
        }

        let mut best: Option<(usize, f64)> = None;
        for (position, record) in records.iter().enumerate() {
            let score = self.score_record(&normalized, record);
            // Strictly greater keeps the earliest record on ties.
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((position, score));
            }
        }

        let Some((position, score)) = best else {
            return MatchResult::NoMatch {
                reason: NoMatchReason::EmptyStore,
            };
        };

        tracing::debug!(query = %normalized, position, score, "best candidate");

        if score > MATCH_THRESHOLD {
            let record = records.into_iter().nth(position).unwrap_or_default();
            MatchResult::Hit {
                matched: Matched::Record { record, position },
                score,
            }
        } else {
            MatchResult::NoMatch {
                reason: NoMatchReason::BelowThreshold { best_score: score },
            }
        }
    }

    /// Score against the key column's value, or, when the record has no
    /// key column, the best of each value and all values joined.
    fn score_record(&self, normalized: &str, record: &Record) -> f64 {
        let key_value = self
            .config
            .key_column
            .as_deref()
            .and_then(|column| record.get(column));
        match key_value {
            Some(value) => self.score_candidate(normalized, value),
            None => record
                .iter()
                .map(|(_, value)| value.to_string())
                .chain(std::iter::once(record.to_text()))
                .map(|candidate| self.score_candidate(normalized, &candidate))
                .fold(0.0, f64::max),
        }
    }

    fn score_candidate(&self, normalized: &str, candidate: &str) -> f64 {
        clamp_score(self.similarity.score(normalized, &normalize(candidate)))
    }
}

/// Match with the default configuration and scorer.
pub fn match_query<S: RecordStore + ?Sized>(query: &str, store: &S) -> MatchResult {
    Matcher::default().match_query(query, store)
}

/// Trim and lower-case.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn is_greeting(normalized: &str) -> bool {
    GREETINGS.contains(&normalized)
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}
