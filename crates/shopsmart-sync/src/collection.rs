//! Collection descriptors
//!
//! A [`CollectionSpec`] carries everything the generic sync and mutation
//! machinery needs to know about one collection: its name, the nouns used in
//! notifications, its default dataset, its view order and its form rules.

use crate::documents::{default_attributes, Document, SortDirection};
use crate::projector::ViewProjector;
use shopsmart_store::{Attributes, CollectionPath};
use std::fmt;
use std::sync::Arc;

/// Form validation over raw attributes; returns the first failing rule's message
pub type FormValidator = Arc<dyn Fn(&Attributes) -> Result<(), String> + Send + Sync>;

/// Static description of one collection
#[derive(Clone)]
pub struct CollectionSpec {
    name: String,
    noun: String,
    load_label: String,
    defaults: Arc<[Attributes]>,
    projector: ViewProjector,
    validator: Option<FormValidator>,
}

impl CollectionSpec {
    /// Collection without defaults or validation
    #[must_use]
    pub fn new(name: impl Into<String>, noun: impl Into<String>, projector: ViewProjector) -> Self {
        let name = name.into();
        Self {
            load_label: name.clone(),
            name,
            noun: noun.into(),
            defaults: Arc::from(Vec::new()),
            projector,
            validator: None,
        }
    }

    /// Descriptor for a typed document collection
    #[must_use]
    pub fn of<D: Document>() -> Self {
        Self::new(
            D::COLLECTION,
            D::NOUN,
            ViewProjector::new(D::DATE_FIELD, D::NAME_FIELD, D::ORDER),
        )
        .with_load_label(D::LOAD_LABEL)
        .with_defaults(default_attributes::<D>())
        .with_validator(|attributes| {
            let document = D::from_attributes(attributes)
                .map_err(|e| format!("Malformed {}: {e}", D::NOUN.to_lowercase()))?;
            document.validate()
        })
    }

    /// Label used in load failures
    #[must_use]
    pub fn with_load_label(mut self, label: impl Into<String>) -> Self {
        self.load_label = label.into();
        self
    }

    /// Default dataset, in insertion order
    #[must_use]
    pub fn with_defaults(mut self, defaults: Vec<Attributes>) -> Self {
        self.defaults = defaults.into();
        self
    }

    /// Form validation rule
    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Attributes) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Collection name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capitalized noun
    #[inline]
    #[must_use]
    pub fn noun(&self) -> &str {
        &self.noun
    }

    /// Label used in load failures
    #[inline]
    #[must_use]
    pub fn load_label(&self) -> &str {
        &self.load_label
    }

    /// Default dataset
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> Arc<[Attributes]> {
        Arc::clone(&self.defaults)
    }

    /// View ordering
    #[inline]
    #[must_use]
    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    /// Store path under an application namespace
    #[must_use]
    pub fn path(&self, app_id: &str) -> CollectionPath {
        CollectionPath::shared(app_id, self.name.clone())
    }

    /// Apply the form rules
    ///
    /// # Errors
    /// Returns the first failing rule's message
    pub fn validate(&self, attributes: &Attributes) -> Result<(), String> {
        self.validator
            .as_ref()
            .map_or(Ok(()), |validator| validator(attributes))
    }

    /// "Equipment added successfully!"
    pub(crate) fn success_message(&self, verb: &str) -> String {
        format!("{} {verb} successfully!", self.noun)
    }

    /// "Error saving equipment: ..."
    pub(crate) fn failure_message(&self, action: &str, cause: &dyn fmt::Display) -> String {
        format!("Error {action} {}: {cause}", self.noun.to_lowercase())
    }

    /// "Error loading equipment: ..."
    pub(crate) fn load_failure_message(&self, cause: &dyn fmt::Display) -> String {
        format!("Error loading {}: {cause}", self.load_label)
    }

    /// "User ID not available after authentication. Cannot load equipment data."
    pub(crate) fn missing_identity_message(&self) -> String {
        format!(
            "User ID not available after authentication. Cannot load {} data.",
            self.load_label
        )
    }
}

impl fmt::Debug for CollectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSpec")
            .field("name", &self.name)
            .field("noun", &self.noun)
            .field("defaults", &self.defaults.len())
            .field("projector", &self.projector)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self::new("items", "Item", ViewProjector::new("date", "name", SortDirection::Ascending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Equipment, MaintenanceEntry, Project};
    use serde_json::json;

    #[test]
    fn typed_specs_carry_document_settings() {
        let equipment = CollectionSpec::of::<Equipment>();
        assert_eq!(equipment.name(), "equipment");
        assert_eq!(equipment.defaults().len(), 14);
        assert_eq!(equipment.projector().date_field(), "acquisitionDate");
        assert_eq!(equipment.projector().direction(), SortDirection::Descending);

        let maintenance = CollectionSpec::of::<MaintenanceEntry>();
        assert_eq!(maintenance.projector().name_field(), "item");
        assert_eq!(maintenance.defaults().len(), 5);

        assert_eq!(CollectionSpec::of::<Project>().defaults().len(), 3);
    }

    #[test]
    fn path_uses_shared_namespace() {
        let path = CollectionSpec::of::<Project>().path("default-app-id");
        assert_eq!(path.to_string(), "artifacts/default-app-id/public/data/projects");
    }

    #[test]
    fn messages() {
        let spec = CollectionSpec::of::<MaintenanceEntry>();
        assert_eq!(spec.success_message("added"), "Maintenance entry added successfully!");
        assert_eq!(
            spec.failure_message("saving", &"offline"),
            "Error saving maintenance entry: offline"
        );
        assert_eq!(
            spec.load_failure_message(&"boom"),
            "Error loading maintenance log: boom"
        );
        assert_eq!(
            CollectionSpec::of::<Equipment>().missing_identity_message(),
            "User ID not available after authentication. Cannot load equipment data."
        );
    }

    #[test]
    fn validation_runs_document_rules() {
        let spec = CollectionSpec::of::<Equipment>();
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!(""));
        attrs.insert("category".into(), json!("Hand Tool"));
        attrs.insert("status".into(), json!("Operational"));
        assert_eq!(spec.validate(&attrs), Err("Item Name is required.".into()));

        attrs.insert("name".into(), json!("Hammer"));
        assert_eq!(spec.validate(&attrs), Ok(()));
    }

    #[test]
    fn malformed_attributes_are_rejected() {
        let spec = CollectionSpec::of::<Project>();
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!(12));
        let err = spec.validate(&attrs).unwrap_err();
        assert!(err.starts_with("Malformed project:"));
    }

    #[test]
    fn untyped_spec_accepts_anything() {
        let spec = CollectionSpec::default();
        assert!(spec.validate(&Attributes::new()).is_ok());
        assert!(spec.defaults().is_empty());
    }
}
