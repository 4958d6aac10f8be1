use crate::models::DocumentId;
use crate::workflow::acknowledgment::AckState;
use reqwest::StatusCode;
use thiserror::Error;

/// List or detail fetch failed. Cached state is left as it was.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("document {0} is not in the document list")]
    NotListed(DocumentId),
}

impl NetworkError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(err) => err.status(),
            Self::Status { status, .. } => Some(*status),
            Self::NotListed(_) => None,
        }
    }
}

/// Upload rejected before or by the server. The form stays with the caller.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("upload failed ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The acknowledge gate refused the operation; no request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("no document is selected")]
    NoSelection,

    #[error("the acknowledgment checkbox is not checked")]
    NotChecked,

    #[error("operation not allowed while {0:?}")]
    InvalidState(AckState),
}

#[derive(Debug, Error)]
pub enum AcknowledgeError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("acknowledgment failed ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("acknowledgment request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Preview pipeline failure. Shown in the render area only.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not fetch document bytes: {0}")]
    Fetch(#[from] NetworkError),

    #[error("could not open document: {0}")]
    Open(String),

    #[error("could not render page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("render command failed: {0}")]
    Command(String),

    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors outside the document workflow: configuration and session setup.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] service_core::CoreError),

    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(String),

    #[error("login failed ({0})")]
    Login(StatusCode),
}
