//! Document lifecycle and acknowledgment workflow.
//!
//! [`DocumentWorkflow`] wires the store, the acknowledgment controller and
//! the preview renderer around one shared [`Session`]:
//!
//! 1. `start` loads the list and projects the dashboard.
//! 2. `open(id)` selects the document, fetches its detail and, once that
//!    resolves for the still-current selection, spawns the preview render.
//! 3. The acknowledgment controller drives checkbox, submit, reload and close.

pub mod acknowledgment;
pub mod dashboard;
pub mod session;
pub mod store;

pub use acknowledgment::{AckState, AcknowledgmentController, SubmitOutcome};
pub use dashboard::{DashboardView, DocumentCard, StatusBadge};
pub use session::{AcknowledgmentGate, Selection, SelectionState, Session, SessionSnapshot};
pub use store::{DetailOutcome, DocumentList, DocumentStore};

use crate::error::{NetworkError, UploadError};
use crate::models::{DocumentDetail, DocumentId, UploadForm};
use crate::preview::{PreviewRenderer, RenderArea, RenderBackend, RenderOutcome};
use crate::services::DocumentApi;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A preview whose detail has loaded. The render runs in the background.
pub struct OpenedPreview {
    pub detail: Arc<DocumentDetail>,
    pub selection: Selection,
    pub render: JoinHandle<RenderOutcome>,
}

pub struct DocumentWorkflow {
    session: Session,
    store: DocumentStore,
    acknowledgment: AcknowledgmentController,
    renderer: Arc<PreviewRenderer>,
}

impl DocumentWorkflow {
    pub fn new(api: Arc<dyn DocumentApi>, backend: Arc<dyn RenderBackend>, scale: f32) -> Self {
        let session = Session::new();
        let store = DocumentStore::new(api.clone(), session.clone());
        let acknowledgment =
            AcknowledgmentController::new(api.clone(), session.clone(), store.clone());
        let renderer = Arc::new(PreviewRenderer::new(api, backend, scale));

        Self {
            session,
            store,
            acknowledgment,
            renderer,
        }
    }

    /// Initial list load. A failure leaves an empty dashboard; it is logged by the store.
    pub async fn start(&self) -> DashboardView {
        let _ = self.store.load().await;
        self.dashboard()
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView::from_store(&self.store)
    }

    /// Select `id`. Returns `None` when a later selection superseded this one.
    pub async fn open(&self, id: DocumentId) -> Result<Option<OpenedPreview>, NetworkError> {
        match self.store.load_detail(id).await? {
            DetailOutcome::Superseded => Ok(None),
            DetailOutcome::Loaded { detail, selection } => {
                let renderer = self.renderer.clone();
                let locator = detail.source_locator.clone();
                let render_selection = selection.clone();
                let render =
                    tokio::spawn(async move { renderer.render(&locator, &render_selection).await });

                Ok(Some(OpenedPreview {
                    detail,
                    selection,
                    render,
                }))
            }
        }
    }

    /// Close the preview, abandoning any in-flight render.
    pub fn close(&self) {
        self.session.close();
        self.renderer.surface().clear();
    }

    pub async fn upload(&self, form: &UploadForm) -> Result<(), UploadError> {
        self.store.upload(form).await
    }

    pub async fn delete(&self, id: DocumentId) -> Result<(), NetworkError> {
        self.store.delete(id).await
    }

    pub async fn download(&self, id: DocumentId) -> Result<Vec<u8>, NetworkError> {
        self.store.download(id).await
    }

    /// What the render area shows for the open preview; `Closed` otherwise.
    pub fn render_area(&self) -> RenderArea {
        match self.session.current_selection() {
            Some(selection) if self.session.snapshot().preview_open => {
                self.renderer.area_for(&selection)
            }
            _ => RenderArea::Closed,
        }
    }

    pub fn active_detail(&self) -> Option<Arc<DocumentDetail>> {
        self.store.active_detail()
    }

    pub fn acknowledgment(&self) -> &AcknowledgmentController {
        &self.acknowledgment
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
