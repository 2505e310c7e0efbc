//! Core record types
//!
//! Defines the data carried across the store boundary:
//! - Record identifiers (store-assigned, never reused)
//! - Attribute sets (schemaless JSON objects)
//! - Collection paths
//! - Full-state snapshots

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use ulid::Ulid;

/// Attribute set of a record, as stored
pub type Attributes = Map<String, Value>;

/// Opaque record identifier assigned by the store on creation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier (ULID: unique, never reused)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Wrap an identifier received from elsewhere
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A record: identifier plus attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Variant-specific attributes
    pub attributes: Attributes,
}

impl Record {
    /// Create record
    #[inline]
    #[must_use]
    pub fn new(id: RecordId, attributes: Attributes) -> Self {
        Self { id, attributes }
    }

    /// Look up a string attribute. Non-string values are treated as absent.
    #[inline]
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Logical path of a collection in the remote store
///
/// Shared collections live under `artifacts/<appId>/public/data/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionPath {
    app_id: String,
    name: String,
}

impl CollectionPath {
    /// Path of a shared (non per-user) collection
    #[inline]
    #[must_use]
    pub fn shared(app_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
        }
    }

    /// Application identifier namespace
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Collection name (last path segment)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifacts/{}/public/data/{}", self.app_id, self.name)
    }
}

/// Full current state of a collection at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Collection the snapshot belongs to
    pub collection: CollectionPath,
    /// Records in store order
    pub records: Vec<Record>,
}

impl Snapshot {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(collection: CollectionPath, records: Vec<Record>) -> Self {
        Self {
            collection,
            records,
        }
    }

    /// True if the collection held no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Find a record by id
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }
}
