use crate::models::{DocumentId, DocumentStatus, DocumentSummary};
use crate::workflow::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub class: &'static str,
}

impl From<DocumentStatus> for StatusBadge {
    fn from(status: DocumentStatus) -> Self {
        Self {
            label: status.label(),
            class: status.css_class(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCard {
    pub id: DocumentId,
    pub filename: String,
    pub uploader: String,
    pub status: DocumentStatus,
    pub badge: StatusBadge,
}

impl From<&DocumentSummary> for DocumentCard {
    fn from(doc: &DocumentSummary) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            uploader: doc.uploader.clone(),
            status: doc.status,
            badge: doc.status.into(),
        }
    }
}

/// Projection of the cached list: every document, plus the ones still
/// awaiting the current user's acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub all: Vec<DocumentCard>,
    pub pending: Vec<DocumentCard>,
    pub show_pending: bool,
}

impl DashboardView {
    pub fn project(documents: &[DocumentSummary]) -> Self {
        let all: Vec<DocumentCard> = documents.iter().map(DocumentCard::from).collect();
        let pending: Vec<DocumentCard> = all
            .iter()
            .filter(|card| card.status.is_pending())
            .cloned()
            .collect();
        let show_pending = !pending.is_empty();

        Self {
            all,
            pending,
            show_pending,
        }
    }

    /// Empty until the store has a list.
    pub fn from_store(store: &DocumentStore) -> Self {
        store
            .documents()
            .map(|docs| Self::project(&docs))
            .unwrap_or_default()
    }
}
