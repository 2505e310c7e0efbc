//! Mutation gateway
//!
//! Every create/update/delete goes through one pipeline:
//! 1. Precondition: session ready with an identity, else refuse without
//!    touching the store
//! 2. Form validation with the collection's rules
//! 3. Dispatch to the store (update when the form has an edit target)
//! 4. Exactly one notification per outcome; the form closes on success only

use crate::collection::CollectionSpec;
use crate::documents::Document;
use crate::error::GatewayError;
use crate::notify::{Notification, Notifier};
use crate::session::SessionReader;
use shopsmart_store::{Attributes, CollectionPath, Record, RecordId, RecordStore};
use std::fmt;
use std::sync::Arc;

/// What an open form is doing
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    /// Adding a new record
    Create,
    /// Editing an existing record
    Edit(Record),
}

/// Per-collection form state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormState {
    /// No form shown
    #[default]
    Closed,
    /// Form shown
    Open(FormMode),
}

impl FormState {
    /// Open an empty form
    pub fn open_create(&mut self) {
        *self = Self::Open(FormMode::Create);
    }

    /// Open the form on an existing record
    pub fn open_edit(&mut self, target: Record) {
        *self = Self::Open(FormMode::Edit(target));
    }

    /// Close without saving
    pub fn cancel(&mut self) {
        *self = Self::Closed;
    }

    /// "Add new" / "Hide form" button: flips visibility, never keeps an edit target
    pub fn toggle(&mut self) {
        *self = match self {
            Self::Closed => Self::Open(FormMode::Create),
            Self::Open(_) => Self::Closed,
        };
    }

    /// Check if the form is shown
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Record being edited, if any
    #[must_use]
    pub fn editing(&self) -> Option<&Record> {
        match self {
            Self::Open(FormMode::Edit(record)) => Some(record),
            _ => None,
        }
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New record with its store-assigned id
    Created(RecordId),
    /// Existing record updated
    Updated(RecordId),
}

impl SaveOutcome {
    /// Identifier of the saved record
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Record removed
    Deleted,
    /// Record was already gone; reported as success
    AlreadyGone,
}

/// Gated mutations for one collection
#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn RecordStore>,
    session: SessionReader,
    notifier: Arc<dyn Notifier>,
    spec: CollectionSpec,
    path: CollectionPath,
}

impl MutationGateway {
    /// Create gateway
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        session: SessionReader,
        notifier: Arc<dyn Notifier>,
        spec: CollectionSpec,
        path: CollectionPath,
    ) -> Self {
        Self {
            store,
            session,
            notifier,
            spec,
            path,
        }
    }

    /// Collection this gateway writes to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Collection descriptor
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// Submit a form. Updates the edit target if there is one, creates otherwise.
    ///
    /// The form closes on success and is left untouched on failure.
    ///
    /// # Errors
    /// - `GatewayError::NotAuthenticated` if the session is not usable
    /// - `GatewayError::Invalid` if a form rule fails
    /// - `GatewayError::Store` if the store rejects the write
    pub async fn save(
        &self,
        form: &mut FormState,
        attributes: Attributes,
    ) -> Result<SaveOutcome, GatewayError> {
        self.authorize()?;
        self.check_form(&attributes)?;

        let (result, verb) = match form.editing() {
            Some(target) => {
                let id = target.id.clone();
                let result = self
                    .store
                    .update(&self.path, &id, attributes)
                    .await
                    .map(|()| SaveOutcome::Updated(id));
                (result, "updated")
            }
            None => {
                let result = self
                    .store
                    .create(&self.path, attributes)
                    .await
                    .map(SaveOutcome::Created);
                (result, "added")
            }
        };

        match result {
            Ok(outcome) => {
                tracing::info!(collection = %self.path, id = %outcome.id(), verb, "record saved");
                self.notifier
                    .notify(Notification::success(self.spec.success_message(verb)));
                form.cancel();
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(collection = %self.path, "save failed: {e}");
                self.notifier
                    .notify(Notification::error(self.spec.failure_message("saving", &e)));
                Err(e.into())
            }
        }
    }

    /// Submit a typed document
    ///
    /// # Errors
    /// Same as [`Self::save`]; a document that cannot be serialized is `Invalid`
    pub async fn save_document<D: Document>(
        &self,
        form: &mut FormState,
        document: &D,
    ) -> Result<SaveOutcome, GatewayError> {
        let attributes = match document.to_attributes() {
            Ok(attributes) => attributes,
            Err(e) => {
                let message = format!("Malformed {}: {e}", D::NOUN.to_lowercase());
                self.notifier.notify(Notification::error(message.clone()));
                return Err(GatewayError::Invalid(message));
            }
        };
        self.save(form, attributes).await
    }

    /// Create a record outside any form
    ///
    /// # Errors
    /// Same as [`Self::save`]
    pub async fn create(&self, attributes: Attributes) -> Result<RecordId, GatewayError> {
        let mut form = FormState::Open(FormMode::Create);
        self.save(&mut form, attributes)
            .await
            .map(|outcome| outcome.id().clone())
    }

    /// Delete a record. An id that is already gone counts as success.
    ///
    /// # Errors
    /// - `GatewayError::NotAuthenticated` if the session is not usable
    /// - `GatewayError::Store` for store failures other than a missing record
    pub async fn delete(&self, id: &RecordId) -> Result<DeleteOutcome, GatewayError> {
        self.authorize()?;

        let outcome = match self.store.delete(&self.path, id).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.is_not_found() => {
                tracing::warn!(collection = %self.path, %id, "delete of missing record: {e}");
                DeleteOutcome::AlreadyGone
            }
            Err(e) => {
                tracing::error!(collection = %self.path, %id, "delete failed: {e}");
                self.notifier
                    .notify(Notification::error(self.spec.failure_message("deleting", &e)));
                return Err(e.into());
            }
        };

        self.notifier
            .notify(Notification::success(self.spec.success_message("deleted")));
        Ok(outcome)
    }

    fn authorize(&self) -> Result<(), GatewayError> {
        if self.session.current().is_authenticated() {
            return Ok(());
        }
        let err = GatewayError::NotAuthenticated;
        tracing::warn!(collection = %self.path, "mutation refused: {err}");
        self.notifier.notify(Notification::error(err.to_string()));
        Err(err)
    }

    fn check_form(&self, attributes: &Attributes) -> Result<(), GatewayError> {
        self.spec.validate(attributes).map_err(|message| {
            tracing::debug!(collection = %self.path, %message, "form rejected");
            self.notifier.notify(Notification::error(message.clone()));
            GatewayError::Invalid(message)
        })
    }
}

impl fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationGateway")
            .field("path", &self.path)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Equipment, Project};
    use crate::notify::NotificationCenter;
    use crate::session::{Session, UserId};
    use pretty_assertions::assert_eq;
    use shopsmart_store::InMemoryRecordStore;

    struct Fixture {
        store: InMemoryRecordStore,
        notifications: Arc<NotificationCenter>,
        gateway: MutationGateway,
    }

    fn fixture(session: Session) -> Fixture {
        let store = InMemoryRecordStore::new();
        let notifications = Arc::new(NotificationCenter::default());
        let spec = CollectionSpec::of::<Equipment>();
        let path = spec.path("app");
        let gateway = MutationGateway::new(
            Arc::new(store.clone()),
            SessionReader::fixed(session),
            notifications.clone(),
            spec,
            path,
        );
        Fixture {
            store,
            notifications,
            gateway,
        }
    }

    fn signed_in() -> Fixture {
        fixture(Session::authenticated(UserId::new("u1")))
    }

    fn drill() -> Attributes {
        Equipment::new("Cordless Drill", "Power Tool")
            .acquired_on("2024-04-01")
            .to_attributes()
            .unwrap()
    }

    fn last_message(f: &Fixture) -> String {
        f.notifications.current().unwrap().message
    }

    #[tokio::test]
    async fn create_closes_form_and_notifies() {
        let f = signed_in();
        let mut form = FormState::default();
        form.open_create();

        let outcome = f.gateway.save(&mut form, drill()).await.unwrap();

        assert!(matches!(outcome, SaveOutcome::Created(_)));
        assert_eq!(form, FormState::Closed);
        assert_eq!(last_message(&f), "Equipment added successfully!");
        assert_eq!(f.store.records(f.gateway.path()).len(), 1);
    }

    #[tokio::test]
    async fn edit_target_selects_update() {
        let f = signed_in();
        let id = f.gateway.create(drill()).await.unwrap();
        let target = f.store.records(f.gateway.path()).remove(0);

        let mut form = FormState::default();
        form.open_edit(target);
        let mut changed = drill();
        changed.insert("status".into(), "Repair".into());

        let outcome = f.gateway.save(&mut form, changed).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Updated(id.clone()));
        assert_eq!(last_message(&f), "Equipment updated successfully!");
        let records = f.store.records(f.gateway.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].text("status"), Some("Repair"));
    }

    #[tokio::test]
    async fn not_ready_session_is_refused() {
        let f = fixture(Session::pending());
        let mut form = FormState::Open(FormMode::Create);

        let err = f.gateway.save(&mut form, drill()).await.unwrap_err();

        assert!(matches!(err, GatewayError::NotAuthenticated));
        assert!(form.is_open());
        assert_eq!(
            last_message(&f),
            "Database not ready or user not authenticated."
        );
        assert!(f.store.records(f.gateway.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_identity_is_refused() {
        let f = fixture(Session::unauthenticated());
        let err = f.gateway.delete(&RecordId::new("x")).await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn invalid_form_stays_open() {
        let f = signed_in();
        let mut form = FormState::Open(FormMode::Create);
        let mut attrs = drill();
        attrs.insert("acquisitionDate".into(), "someday".into());

        let err = f.gateway.save(&mut form, attrs).await.unwrap_err();

        assert!(matches!(err, GatewayError::Invalid(_)));
        assert_eq!(form, FormState::Open(FormMode::Create));
        assert_eq!(last_message(&f), "Invalid Acquisition Date format.");
        assert!(f.store.records(f.gateway.path()).is_empty());
    }

    #[tokio::test]
    async fn store_failure_keeps_form_open() {
        let f = signed_in();
        f.store.set_online(false);
        let mut form = FormState::Open(FormMode::Create);

        let err = f.gateway.save(&mut form, drill()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Store(_)));
        assert!(form.is_open());
        assert_eq!(
            last_message(&f),
            "Error saving equipment: store unavailable: no active connection"
        );
        assert!(f.notifications.current().unwrap().is_error());
    }

    #[tokio::test]
    async fn update_of_missing_record_is_an_error() {
        let f = signed_in();
        let ghost = Record::new(RecordId::new("ghost"), drill());
        let mut form = FormState::default();
        form.open_edit(ghost.clone());

        let err = f.gateway.save(&mut form, drill()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Store(ref e) if e.is_not_found()));
        assert_eq!(form.editing(), Some(&ghost));
    }

    #[tokio::test]
    async fn delete_reports_success() {
        let f = signed_in();
        let id = f.gateway.create(drill()).await.unwrap();

        assert_eq!(f.gateway.delete(&id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(last_message(&f), "Equipment deleted successfully!");
    }

    #[tokio::test]
    async fn delete_of_missing_record_is_soft() {
        let f = signed_in();
        let outcome = f.gateway.delete(&RecordId::new("ghost")).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::AlreadyGone);
        let shown = f.notifications.current().unwrap();
        assert!(!shown.is_error());
    }

    #[tokio::test]
    async fn delete_failure_notifies() {
        let f = signed_in();
        f.store.set_online(false);
        let err = f.gateway.delete(&RecordId::new("x")).await.unwrap_err();

        assert!(matches!(err, GatewayError::Store(_)));
        assert!(last_message(&f).starts_with("Error deleting equipment:"));
    }

    #[tokio::test]
    async fn typed_document_save() {
        let store = InMemoryRecordStore::new();
        let spec = CollectionSpec::of::<Project>();
        let gateway = MutationGateway::new(
            Arc::new(store.clone()),
            SessionReader::fixed(Session::authenticated(UserId::new("u"))),
            Arc::new(NotificationCenter::default()),
            spec.clone(),
            spec.path("app"),
        );
        let mut form = FormState::Open(FormMode::Create);

        gateway
            .save_document(&mut form, &Project::new("Bench PSU").due_on("2025-09-01"))
            .await
            .unwrap();

        let saved = store.records(gateway.path());
        assert_eq!(saved[0].text("dueDate"), Some("2025-09-01"));
    }

    #[test]
    fn toggle_clears_edit_target() {
        let mut form = FormState::default();
        form.toggle();
        assert_eq!(form, FormState::Open(FormMode::Create));
        form.toggle();
        assert_eq!(form, FormState::Closed);

        form.open_edit(Record::new(RecordId::new("r"), Attributes::new()));
        form.toggle();
        assert_eq!(form, FormState::Closed);
        form.toggle();
        assert!(form.editing().is_none());
    }
}
