use crate::error::{NetworkError, UploadError};
use crate::models::{DocumentDetail, DocumentId, DocumentSummary, UploadForm};
use crate::services::DocumentApi;
use crate::workflow::session::{Selection, Session};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub type DocumentList = Arc<[DocumentSummary]>;

#[derive(Default)]
struct StoreCache {
    documents: Option<DocumentList>,
    detail: Option<Arc<DocumentDetail>>,
    /// Sequence numbers so an older list response never replaces a newer one.
    issued_loads: u64,
    applied_load: u64,
}

/// Result of a detail fetch that did not fail.
#[derive(Debug)]
pub enum DetailOutcome {
    Loaded {
        detail: Arc<DocumentDetail>,
        selection: Selection,
    },
    /// Another document was selected while the request was in flight.
    Superseded,
}

/// Caches the document list and the selected document's detail.
#[derive(Clone)]
pub struct DocumentStore {
    api: Arc<dyn DocumentApi>,
    session: Session,
    cache: Arc<Mutex<StoreCache>>,
    list_tx: Arc<watch::Sender<DocumentList>>,
}

impl DocumentStore {
    pub fn new(api: Arc<dyn DocumentApi>, session: Session) -> Self {
        let (list_tx, _) = watch::channel(DocumentList::from(Vec::new()));
        Self {
            api,
            session,
            cache: Arc::new(Mutex::new(StoreCache::default())),
            list_tx: Arc::new(list_tx),
        }
    }

    fn cache(&self) -> MutexGuard<'_, StoreCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the full list. On failure the cached list is kept.
    pub async fn load(&self) -> Result<DocumentList, NetworkError> {
        let sequence = {
            let mut cache = self.cache();
            cache.issued_loads += 1;
            cache.issued_loads
        };

        match self.api.list_documents().await {
            Ok(documents) => {
                let documents = DocumentList::from(documents);
                {
                    let mut cache = self.cache();
                    if sequence < cache.applied_load {
                        tracing::debug!(sequence, "Dropping out-of-order document list");
                        return Ok(documents);
                    }
                    cache.applied_load = sequence;
                    cache.documents = Some(documents.clone());
                }
                metrics::counter!("document_list_loads_total", "outcome" => "success")
                    .increment(1);
                tracing::info!(count = documents.len(), "Document list loaded");
                self.list_tx.send_replace(documents.clone());
                Ok(documents)
            }
            Err(e) => {
                metrics::counter!("document_list_loads_total", "outcome" => "failure")
                    .increment(1);
                tracing::error!(error = %e, "Failed to load documents");
                Err(e)
            }
        }
    }

    /// Select `id` and fetch its detail.
    ///
    /// Fails closed: on any error no detail is active and the preview stays
    /// shut. A response for a superseded selection is dropped unapplied.
    pub async fn load_detail(&self, id: DocumentId) -> Result<DetailOutcome, NetworkError> {
        let selection = self.session.select(id);

        let listed = {
            let mut cache = self.cache();
            cache.detail = None;
            cache
                .documents
                .as_ref()
                .is_none_or(|docs| docs.iter().any(|d| d.id == id))
        };
        if !listed {
            tracing::warn!(document_id = id, "Refusing to open a document missing from the list");
            self.session.close_if_current(&selection);
            return Err(NetworkError::NotListed(id));
        }

        let result = self.api.get_document(id).await;

        if !self.session.is_current(&selection) {
            tracing::debug!(document_id = id, "Dropping detail for superseded selection");
            return Ok(DetailOutcome::Superseded);
        }

        match result {
            Ok(detail) => {
                let detail = Arc::new(detail);
                self.cache().detail = Some(detail.clone());
                if !self.session.activate(&selection) {
                    self.cache().detail = None;
                    return Ok(DetailOutcome::Superseded);
                }
                tracing::info!(document_id = id, filename = %detail.filename, "Document detail loaded");
                Ok(DetailOutcome::Loaded { detail, selection })
            }
            Err(e) => {
                tracing::error!(document_id = id, error = %e, "Failed to load document details");
                self.session.close_if_current(&selection);
                Err(e)
            }
        }
    }

    /// Drop cached list and detail so the next load hits the network.
    pub fn invalidate(&self) {
        let mut cache = self.cache();
        cache.documents = None;
        cache.detail = None;
        tracing::debug!("Document cache invalidated");
    }

    pub fn documents(&self) -> Option<DocumentList> {
        self.cache().documents.clone()
    }

    /// Detail of the open preview, if its selection is still current.
    pub fn active_detail(&self) -> Option<Arc<DocumentDetail>> {
        let detail = self.cache().detail.clone()?;
        let snapshot = self.session.snapshot();
        (snapshot.preview_open && snapshot.selection.current == Some(detail.id)).then_some(detail)
    }

    /// Receives every successfully loaded list.
    pub fn subscribe(&self) -> watch::Receiver<DocumentList> {
        self.list_tx.subscribe()
    }

    pub async fn upload(&self, form: &UploadForm) -> Result<(), UploadError> {
        self.api.upload_document(form).await?;
        self.refresh(None).await;
        Ok(())
    }

    /// Delete `id`. An open preview of that document is closed; any other
    /// open preview keeps its detail.
    pub async fn delete(&self, id: DocumentId) -> Result<(), NetworkError> {
        self.api.delete_document(id).await.inspect_err(|e| {
            tracing::error!(document_id = id, error = %e, "Failed to delete document");
        })?;

        let owner = self.session.current_selection().filter(|s| s.id == id);
        self.invalidate_after_change(owner.as_ref());
        if let Some(owner) = &owner {
            self.session.close_if_current(owner);
        }
        let _ = self.load().await;
        Ok(())
    }

    /// Raw bytes of the stored document, as served for download.
    pub async fn download(&self, id: DocumentId) -> Result<Vec<u8>, NetworkError> {
        let bytes = self.api.download_document(id).await.inspect_err(|e| {
            tracing::error!(document_id = id, error = %e, "Failed to download document");
        })?;
        tracing::info!(document_id = id, size = bytes.len(), "Document downloaded");
        Ok(bytes)
    }

    /// Reload the list after a mutation. A failed reload is only logged.
    ///
    /// The cached detail is dropped only when it belongs to `owner` and
    /// `owner` is still the current selection.
    pub async fn refresh(&self, owner: Option<&Selection>) {
        self.invalidate_after_change(owner);
        let _ = self.load().await;
    }

    fn invalidate_after_change(&self, owner: Option<&Selection>) {
        let owner_current = owner
            .filter(|owner| self.session.is_current(owner))
            .map(|owner| owner.id);

        let mut cache = self.cache();
        cache.documents = None;
        if owner_current.is_some() && cache.detail.as_ref().map(|d| d.id) == owner_current {
            cache.detail = None;
        }
        tracing::debug!("Document list invalidated");
    }
}
