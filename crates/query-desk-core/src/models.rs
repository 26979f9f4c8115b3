//! Core data models used throughout Query Desk.
//!
//! A [`Record`] is one row of the knowledge base: an ordered mapping from
//! column name to string value. A [`MatchResult`] is what the match engine
//! hands back for a single query.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One structured entry in the knowledge base.
///
/// Columns keep the order they were first given in, so a record built from
/// a CSV row serializes back with the header order intact. Setting a column
/// that already exists replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column.into(), value.into());
        self
    }

    fn set(&mut self, column: String, value: String) {
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value stored under `column`, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when this record's column set equals `columns`, ignoring order.
    pub fn has_columns(&self, columns: &[String]) -> bool {
        self.fields.len() == columns.len()
            && columns.iter().all(|c| self.get(c).is_some())
    }

    /// Every value joined by a single space, in column order.
    ///
    /// Used as the match candidate when a record has no key column.
    pub fn to_text(&self) -> String {
        self.fields
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k.into(), v.into());
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (c, v) in &self.fields {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((column, value)) = access.next_entry::<String, String>()? {
                    record.set(column, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// What a successful match resolved to.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Matched {
    /// The query was a greeting; no store lookup happened.
    Greeting { reply: String },
    /// A stored record, with its zero-based insertion position.
    Record { record: Record, position: usize },
}

/// Why a query produced no match. Callers render the two cases differently.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No data has been loaded.
    EmptyStore,
    /// Data exists but nothing scored above the threshold.
    BelowThreshold { best_score: f64 },
}

impl NoMatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoMatchReason::EmptyStore => "empty store",
            NoMatchReason::BelowThreshold { .. } => "below threshold",
        }
    }
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching one query against the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    /// `score` is in `[0, 100]`; 100 means identical after normalization.
    Hit { matched: Matched, score: f64 },
    NoMatch { reason: NoMatchReason },
}

impl MatchResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, MatchResult::Hit { .. })
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            MatchResult::Hit { score, .. } => Some(*score),
            MatchResult::NoMatch { .. } => None,
        }
    }

    /// The matched record, or `None` for greetings and misses.
    pub fn record(&self) -> Option<&Record> {
        match self {
            MatchResult::Hit {
                matched: Matched::Record { record, .. },
                ..
            } => Some(record),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<NoMatchReason> {
        match self {
            MatchResult::NoMatch { reason } => Some(*reason),
            MatchResult::Hit { .. } => None,
        }
    }
}
