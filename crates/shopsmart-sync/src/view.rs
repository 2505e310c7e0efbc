//! Typed access to cached views

use crate::documents::Document;
use crate::projector::CachedView;
use shopsmart_store::RecordId;

/// A view entry: store identifier plus decoded document
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<D> {
    /// Store-assigned identifier
    pub id: RecordId,
    /// Decoded document
    pub document: D,
}

/// A [`CachedView`] decoded into documents, in view order.
///
/// Records that fail to decode are skipped with a warning.
#[derive(Debug, Clone)]
pub struct TypedView<D> {
    entries: Vec<Entry<D>>,
    revision: u64,
    skipped: usize,
}

impl<D: Document> TypedView<D> {
    /// Decode a view
    #[must_use]
    pub fn decode(view: &CachedView) -> Self {
        let mut skipped = 0;
        let entries = view
            .iter()
            .filter_map(|record| match D::from_record(record) {
                Ok(document) => Some(Entry {
                    id: record.id.clone(),
                    document,
                }),
                Err(e) => {
                    tracing::warn!(
                        collection = D::COLLECTION,
                        id = %record.id,
                        "undecodable record skipped: {e}"
                    );
                    skipped += 1;
                    None
                }
            })
            .collect();

        Self {
            entries,
            revision: view.revision(),
            skipped,
        }
    }

    /// Entries in view order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[Entry<D>] {
        &self.entries
    }

    /// Documents in view order
    pub fn documents(&self) -> impl Iterator<Item = &D> {
        self.entries.iter().map(|e| &e.document)
    }

    /// Revision of the source view
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records dropped because they did not decode
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of decoded entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing decoded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by id
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Entry<D>> {
        self.entries.iter().find(|e| &e.id == id)
    }
}
