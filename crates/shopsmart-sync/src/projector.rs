//! View projection
//!
//! Turns an unordered [`Snapshot`] into a deterministically ordered
//! [`CachedView`]. The order is total:
//! 1. Records with a parseable date, by date in the collection's direction,
//!    ties broken by name ascending
//! 2. Records with a missing or unparseable date, by name ascending
//!
//! Names compare byte-lexically; a missing name compares as `""`. The sort
//! is stable, so records with equal keys keep their snapshot order.

use crate::dates::parse_date;
use crate::documents::SortDirection;
use chrono::NaiveDateTime;
use serde::Serialize;
use shopsmart_store::{Record, RecordId, Snapshot};
use std::cmp::Ordering;

/// Ordered, immutable view of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CachedView {
    records: Vec<Record>,
    revision: u64,
}

impl CachedView {
    /// Create view
    #[inline]
    #[must_use]
    pub fn new(records: Vec<Record>, revision: u64) -> Self {
        Self { records, revision }
    }

    /// Records in view order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of snapshots applied so far; 0 before the first
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the view holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by id
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Iterate in view order
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

/// Ordering rule for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewProjector {
    date_field: String,
    name_field: String,
    direction: SortDirection,
}

impl ViewProjector {
    /// Create projector
    #[must_use]
    pub fn new(
        date_field: impl Into<String>,
        name_field: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        Self {
            date_field: date_field.into(),
            name_field: name_field.into(),
            direction,
        }
    }

    /// Attribute holding the date
    #[inline]
    #[must_use]
    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    /// Attribute holding the display name
    #[inline]
    #[must_use]
    pub fn name_field(&self) -> &str {
        &self.name_field
    }

    /// Direction for dated records
    #[inline]
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Compare two records under this projector's order
    #[must_use]
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.compare_keys(&self.key(a), &self.key(b))
    }

    /// Build the ordered view of a snapshot
    #[must_use]
    pub fn project(&self, snapshot: &Snapshot, revision: u64) -> CachedView {
        // Parse each date once instead of once per comparison
        let mut keyed: Vec<(SortKey<'_>, &Record)> = snapshot
            .records
            .iter()
            .map(|record| (self.key(record), record))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));

        CachedView::new(
            keyed.into_iter().map(|(_, record)| record.clone()).collect(),
            revision,
        )
    }

    fn key<'r>(&self, record: &'r Record) -> SortKey<'r> {
        SortKey {
            date: record.text(&self.date_field).and_then(parse_date),
            name: record.text(&self.name_field).unwrap_or(""),
        }
    }

    fn compare_keys(&self, a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
        match (a.date, b.date) {
            (Some(x), Some(y)) => {
                let by_date = match self.direction {
                    SortDirection::Ascending => x.cmp(&y),
                    SortDirection::Descending => y.cmp(&x),
                };
                by_date.then_with(|| a.name.cmp(b.name))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(b.name),
        }
    }
}

struct SortKey<'r> {
    date: Option<NaiveDateTime>,
    name: &'r str,
}
