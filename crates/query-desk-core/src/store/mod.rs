//! Knowledge store abstraction.
//!
//! The [`RecordStore`] trait is the seam between the match engine and
//! wherever records live. The crate ships one backend,
//! [`memory::InMemoryStore`]; loading from and saving to disk is the
//! application's job and goes through [`RecordStore::reload`] and
//! [`RecordStore::all`].
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`append`](RecordStore::append) | Add one record at the end, schema-checked |
//! | [`all`](RecordStore::all) | Snapshot of every record in insertion order |
//! | [`is_empty`](RecordStore::is_empty) | Whether any records exist |
//! | [`columns`](RecordStore::columns) | The established schema, if any |
//! | [`reload`](RecordStore::reload) | Replace the whole contents (bulk load) |
//!
//! Implementations must be `Send + Sync`: appends are serialized and reads
//! run against an immutable snapshot.

pub mod memory;

use crate::error::StoreError;
use crate::models::Record;

/// Ordered, append-only collection of records sharing one column set.
pub trait RecordStore: Send + Sync {
    /// Append `record` at the end.
    ///
    /// Fails with [`StoreError::SchemaMismatch`] when the record's columns
    /// differ from the schema. An empty store without a fixed schema takes
    /// its schema from the first record appended.
    fn append(&self, record: Record) -> Result<(), StoreError>;

    /// All records, in insertion order.
    fn all(&self) -> Vec<Record>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The established column schema, or `None` before the first append
    /// into a store created without fixed columns.
    fn columns(&self) -> Option<Vec<String>>;

    /// Replace the contents with `records`: clear, then append each.
    ///
    /// Validation happens before anything is cleared, so on error the
    /// store is unchanged.
    fn reload(&self, records: Vec<Record>) -> Result<(), StoreError>;
}
