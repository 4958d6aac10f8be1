use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type DocumentId = i64;

/// Per-user acknowledgment status as reported by the list endpoint.
///
/// The server sends human-readable labels; `from_label`/`label` are the only
/// place those strings appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentStatus {
    PendingAcknowledgment,
    Acknowledged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown document status label: {0:?}")]
pub struct UnknownStatus(pub String);

impl DocumentStatus {
    pub fn from_label(label: &str) -> Result<Self, UnknownStatus> {
        match label.trim() {
            "Pending Acknowledgment" => Ok(Self::PendingAcknowledgment),
            "Acknowledged" => Ok(Self::Acknowledged),
            other => Err(UnknownStatus(other.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PendingAcknowledgment => "Pending Acknowledgment",
            Self::Acknowledged => "Acknowledged",
        }
    }

    /// Badge class, e.g. `pending-acknowledgment`.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::PendingAcknowledgment => "pending-acknowledgment",
            Self::Acknowledged => "acknowledged",
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::PendingAcknowledgment)
    }
}

impl TryFrom<String> for DocumentStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
    }
}

impl From<DocumentStatus> for String {
    fn from(status: DocumentStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    pub uploader: String,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub id: DocumentId,
    pub filename: String,
    /// Opaque reference to the raw bytes, served under `/uploads/`.
    #[serde(rename = "filepath")]
    pub source_locator: String,
    #[serde(default)]
    pub uploader: String,
    #[serde(default)]
    pub special_requirements: String,
    #[serde(default)]
    pub signed_by: Vec<UserRef>,
    #[serde(default)]
    pub not_signed_by: Vec<UserRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
}

/// Body of non-2xx API responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiMessage {
    pub fn into_text(self) -> Option<String> {
        self.error.or(self.message)
    }
}
