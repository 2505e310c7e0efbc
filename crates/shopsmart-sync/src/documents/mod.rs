//! Typed documents for the three dashboard collections
//!
//! Each collection stores one document variant. A [`Document`] knows its
//! collection name, how its view is ordered, its default dataset and its
//! form validation rules.

mod equipment;
mod maintenance;
mod project;

pub use equipment::{Equipment, EQUIPMENT_CATEGORIES, EQUIPMENT_STATUSES};
pub use maintenance::MaintenanceEntry;
pub use project::{Project, PROJECT_STATUSES};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shopsmart_store::{Attributes, Record};

/// Ordering of dated records in a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first
    #[default]
    Ascending,
    /// Most recent first
    Descending,
}

/// A document variant stored in one collection
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name under `public/data/`
    const COLLECTION: &'static str;

    /// Capitalized noun used in notifications ("Equipment added successfully!")
    const NOUN: &'static str;

    /// Label used when loading fails ("Error loading equipment: ...")
    const LOAD_LABEL: &'static str;

    /// Date-like attribute the view is ordered by
    const DATE_FIELD: &'static str;

    /// Display-name attribute used as fallback ordering
    const NAME_FIELD: &'static str;

    /// Direction for dated records
    const ORDER: SortDirection;

    /// Default dataset, in insertion order
    fn defaults() -> Vec<Self>;

    /// Form validation; returns the first failing rule's message
    fn validate(&self) -> Result<(), String>;

    /// Display name shown in lists and prompts
    fn display_name(&self) -> &str;

    /// Confirmation text shown before deleting
    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            self.display_name()
        )
    }

    /// Convert into a store attribute set
    fn to_attributes(&self) -> Result<Attributes, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "document serialized to non-object: {other}"
            ))),
        }
    }

    /// Decode from a store attribute set
    fn from_attributes(attributes: &Attributes) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(attributes.clone()))
    }

    /// Decode from a record (the identifier is carried separately)
    fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        Self::from_attributes(&record.attributes)
    }
}

/// Default dataset as attribute sets, in insertion order
#[must_use]
pub fn default_attributes<D: Document>() -> Vec<Attributes> {
    D::defaults()
        .iter()
        .filter_map(|doc| match doc.to_attributes() {
            Ok(attrs) => Some(attrs),
            Err(e) => {
                tracing::error!(collection = D::COLLECTION, "default entry not serializable: {e}");
                None
            }
        })
        .collect()
}

/// Reject an empty or whitespace-only field
pub(crate) fn require(value: &str, message: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// Reject a non-empty value that does not parse as a date
pub(crate) fn optional_date(value: &str, message: &str) -> Result<(), String> {
    if value.is_empty() || crate::dates::is_valid_date(value) {
        Ok(())
    } else {
        Err(message.to_string())
    }
}
