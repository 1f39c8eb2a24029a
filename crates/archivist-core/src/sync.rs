//! Collection synchronizer
//!
//! Owns the authoritative `Collection` and the view state derived from it.
//! Every mutation is two-phase: issue the remote call, then on success
//! reload the whole collection from the service. The local copy is never
//! patched optimistically, and a failed call leaves it untouched.
//!
//! Locks are held only between awaits, so the search term and page can be
//! changed while a remote call is pending.

use archivist_api::{DocumentFields, DocumentId, DocumentRecord, RemoteError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

use crate::capsule;
use crate::collection::Collection;
use crate::liveness::Liveness;
use crate::query::{facets, Page, ViewState};
use crate::receipt::Receipt;
use crate::traits::DocumentService;

/// Result of a remote call that finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled<T> {
    /// Remote call succeeded and its effect is visible locally
    Applied(T),
    /// The owning view was torn down before the call finished; nothing was applied
    Discarded,
}

impl<T> Reconciled<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Reconciled::Applied(value) => Some(value),
            Reconciled::Discarded => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciled::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reconciled<U> {
        match self {
            Reconciled::Applied(value) => Reconciled::Applied(f(value)),
            Reconciled::Discarded => Reconciled::Discarded,
        }
    }
}

/// Proof that the user confirmed deleting one document
///
/// Only `CollectionSynchronizer::request_delete` hands these out.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "nothing is deleted until the confirmation is passed to `delete`"]
pub struct DeleteConfirmation {
    id: DocumentId,
}

impl DeleteConfirmation {
    pub fn id(&self) -> DocumentId {
        self.id
    }
}

struct SyncState {
    collection: Collection,
    view: ViewState,
}

pub struct CollectionSynchronizer {
    service: Arc<dyn DocumentService>,
    state: Mutex<SyncState>,
    liveness: Liveness,
}

impl CollectionSynchronizer {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self::with_view(service, ViewState::default())
    }

    pub fn with_view(service: Arc<dyn DocumentService>, view: ViewState) -> Self {
        Self {
            service,
            state: Mutex::new(SyncState {
                collection: Collection::default(),
                view,
            }),
            liveness: Liveness::new(),
        }
    }

    /// Liveness flag of the owning view. Tear it down when the view goes away.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current collection
    pub fn collection(&self) -> Collection {
        self.state().collection.clone()
    }

    pub fn view_state(&self) -> ViewState {
        self.state().view.clone()
    }

    /// Departments offered as filter options
    pub fn facets(&self) -> Vec<String> {
        let state = self.state();
        facets(state.collection.records())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Derive the visible page
    pub fn page(&self) -> Page {
        let mut state = self.state();
        let SyncState { collection, view } = &mut *state;
        view.derive(collection.records()).to_page()
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.state().view.set_search_term(term);
    }

    pub fn set_department_filter(&self, department: impl Into<String>) {
        self.state().view.set_department_filter(department);
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.state().view.set_page_size(page_size);
    }

    pub fn next_page(&self) -> bool {
        let mut state = self.state();
        let SyncState { collection, view } = &mut *state;
        view.next_page(collection.records())
    }

    pub fn previous_page(&self) -> bool {
        let mut state = self.state();
        let SyncState { collection, view } = &mut *state;
        view.previous_page(collection.records())
    }

    pub fn go_to_page(&self, page: usize) -> bool {
        let mut state = self.state();
        let SyncState { collection, view } = &mut *state;
        view.go_to_page(page, collection.records())
    }

    /// Replace the collection with a fresh copy from the service
    pub async fn load(&self) -> Result<Reconciled<usize>, RemoteError> {
        let result = self.service.list_documents().await;
        if !self.liveness.is_alive() {
            debug!("[CollectionSync] View gone, discarding load result");
            return Ok(Reconciled::Discarded);
        }

        let records = result.map_err(|e| {
            error!("[CollectionSync] Load failed: {}", e);
            RemoteError::LoadFailed {
                message: e.to_string(),
            }
        })?;

        let mut state = self.state();
        state.collection = Collection::from_fetch(records);
        state.view.collection_changed();
        let count = state.collection.len();
        info!("[CollectionSync] Loaded {} documents", count);
        Ok(Reconciled::Applied(count))
    }

    /// Create a document, then reload. A blank title is rejected before any remote call.
    pub async fn create(
        &self,
        fields: DocumentFields,
    ) -> Result<Reconciled<DocumentRecord>, RemoteError> {
        if fields.title().is_none() {
            return Err(RemoteError::CreateFailed {
                message: "title is required".to_string(),
            });
        }

        let result = self.service.create_document(&fields).await;
        if !self.liveness.is_alive() {
            debug!("[CollectionSync] View gone, discarding create result");
            return Ok(Reconciled::Discarded);
        }

        let created = result.map_err(|e| {
            error!("[CollectionSync] Create failed: {}", e);
            RemoteError::CreateFailed {
                message: e.to_string(),
            }
        })?;
        info!("[CollectionSync] Created document {}", created.id);

        Ok(self.load().await?.map(|_| created))
    }

    /// Update the set fields of document `id`, then reload
    pub async fn update(
        &self,
        id: DocumentId,
        fields: DocumentFields,
    ) -> Result<Reconciled<DocumentRecord>, RemoteError> {
        let result = self.service.update_document(id, &fields).await;
        if !self.liveness.is_alive() {
            debug!("[CollectionSync] View gone, discarding update result");
            return Ok(Reconciled::Discarded);
        }

        let updated = result.map_err(|e| {
            error!("[CollectionSync] Update of {} failed: {}", id, e);
            RemoteError::UpdateFailed {
                id,
                message: e.to_string(),
            }
        })?;
        info!("[CollectionSync] Updated document {}", id);

        Ok(self.load().await?.map(|_| updated))
    }

    /// First step of a delete: confirm that `id` is a document the user can see
    pub fn request_delete(&self, id: DocumentId) -> Option<DeleteConfirmation> {
        self.state()
            .collection
            .contains(id)
            .then_some(DeleteConfirmation { id })
    }

    /// Second step of a delete: issue the remote call, then reload
    pub async fn delete(
        &self,
        confirmation: DeleteConfirmation,
    ) -> Result<Reconciled<DocumentId>, RemoteError> {
        let id = confirmation.id;
        let result = self.service.delete_document(id).await;
        if !self.liveness.is_alive() {
            debug!("[CollectionSync] View gone, discarding delete result");
            return Ok(Reconciled::Discarded);
        }

        result.map_err(|e| {
            error!("[CollectionSync] Delete of {} failed: {}", id, e);
            RemoteError::DeleteFailed {
                id,
                message: e.to_string(),
            }
        })?;
        info!("[CollectionSync] Deleted document {}", id);

        Ok(self.load().await?.map(|_| id))
    }

    /// Have the service render the receipt of document `id`
    pub async fn download_receipt(
        &self,
        id: DocumentId,
    ) -> Result<Reconciled<Receipt>, RemoteError> {
        let capsule = self.state().collection.get(id).map(capsule::encode);

        let result = self.service.generate_receipt(id).await;
        if !self.liveness.is_alive() {
            debug!("[CollectionSync] View gone, discarding receipt");
            return Ok(Reconciled::Discarded);
        }

        let pdf = result.map_err(|e| {
            error!("[CollectionSync] Receipt for {} failed: {}", id, e);
            RemoteError::ReceiptFailed {
                id,
                message: e.to_string(),
            }
        })?;

        Ok(Reconciled::Applied(Receipt {
            document_id: id,
            file_name: Receipt::file_name_for(id),
            pdf,
            capsule,
        }))
    }
}
