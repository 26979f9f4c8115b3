//! In-memory [`RecordStore`] implementation.
//!
//! Records live in a `Vec` behind a single `std::sync::RwLock`, so one
//! store can be shared between a writer and any number of readers.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::models::Record;

use super::RecordStore;

#[derive(Default)]
struct Inner {
    columns: Option<Vec<String>>,
    records: Vec<Record>,
}

/// In-memory knowledge store.
#[derive(Default)]
pub struct InMemoryStore {
    /// Columns given at creation time. When set, the schema never changes.
    fixed_columns: Option<Vec<String>>,
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// An empty store whose schema is taken from the first appended record.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store with a schema fixed up front.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            fixed_columns: Some(columns.clone()),
            inner: RwLock::new(Inner {
                columns: Some(columns),
                records: Vec::new(),
            }),
        }
    }

    /// A store holding `records`, schema taken from the first of them.
    pub fn from_records(records: Vec<Record>) -> Result<Self, StoreError> {
        let store = Self::new();
        store.reload(records)?;
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check(columns: &[String], record: &Record) -> Result<(), StoreError> {
    if record.has_columns(columns) {
        Ok(())
    } else {
        Err(StoreError::SchemaMismatch {
            expected: columns.to_vec(),
            found: record.column_names(),
        })
    }
}

impl RecordStore for InMemoryStore {
    fn append(&self, record: Record) -> Result<(), StoreError> {
        let mut guard = self.write();
        let inner = &mut *guard;
        match &inner.columns {
            Some(columns) => check(columns, &record)?,
            None => {
                tracing::debug!(columns = ?record.column_names(), "schema established by first record");
                inner.columns = Some(record.column_names());
            }
        }
        inner.records.push(record);
        Ok(())
    }

    fn all(&self) -> Vec<Record> {
        self.read().records.clone()
    }

    fn len(&self) -> usize {
        self.read().records.len()
    }

    fn columns(&self) -> Option<Vec<String>> {
        self.read().columns.clone()
    }

    fn reload(&self, records: Vec<Record>) -> Result<(), StoreError> {
        let columns = match (&self.fixed_columns, records.first()) {
            (Some(fixed), _) => Some(fixed.clone()),
            (None, Some(first)) => Some(first.column_names()),
            (None, None) => None,
        };
        if let Some(columns) = &columns {
            for record in &records {
                check(columns, record)?;
            }
        }

        let mut inner = self.write();
        inner.columns = columns;
        inner.records = records;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qa(q: &str, a: &str) -> Record {
        Record::new().with("Question", q).with("Response", a)
    }

    #[test]
    fn new_store_is_empty_without_schema() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.columns(), None);
        assert!(store.all().is_empty());
    }

    #[test]
    fn first_append_establishes_schema() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        assert_eq!(
            store.columns(),
            Some(vec!["Question".to_string(), "Response".to_string()])
        );
        assert!(!store.is_empty());
    }

    #[test]
    fn append_then_all_round_trips_in_order() {
        let store = InMemoryStore::new();
        let records: Vec<Record> = (0..5)
            .map(|i| qa(&format!("q{i}"), &format!("a{i}")))
            .collect();
        for r in records.clone() {
            store.append(r).unwrap();
        }
        assert_eq!(store.all(), records);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn duplicates_are_kept() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        store.append(qa("fever", "rest")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn column_order_does_not_matter() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        let reordered = Record::new().with("Response", "fluids").with("Question", "cold");
        store.append(reordered).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn mismatched_append_is_rejected_and_store_unchanged() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        let before = store.all();

        let err = store
            .append(Record::new().with("Mood", "sad").with("Response", "hug"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
        assert_eq!(store.all(), before);
    }

    #[test]
    fn fixed_columns_apply_to_first_append() {
        let store = InMemoryStore::with_columns(["Mood", "Response"]);
        assert!(store.is_empty());
        assert!(store.append(qa("fever", "rest")).is_err());
        assert!(store.is_empty());
        store
            .append(Record::new().with("Mood", "sad").with("Response", "hug"))
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reload_replaces_contents() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        let fresh = vec![Record::new().with("Mood", "sad")];
        store.reload(fresh.clone()).unwrap();
        assert_eq!(store.all(), fresh);
        assert_eq!(store.columns(), Some(vec!["Mood".to_string()]));
    }

    #[test]
    fn reload_with_mixed_schemas_leaves_store_unchanged() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        let before = store.all();

        let mixed = vec![qa("cold", "fluids"), Record::new().with("Mood", "sad")];
        assert!(store.reload(mixed).is_err());
        assert_eq!(store.all(), before);
    }

    #[test]
    fn reload_with_nothing_clears_inferred_schema() {
        let store = InMemoryStore::new();
        store.append(qa("fever", "rest")).unwrap();
        store.reload(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.columns(), None);
    }

    #[test]
    fn reads_from_other_threads_see_appends() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        store.append(qa("fever", "rest")).unwrap();
        let reader = std::sync::Arc::clone(&store);
        let len = std::thread::spawn(move || reader.len()).join().unwrap();
        assert_eq!(len, 1);
    }
}
