pub mod document;
pub mod upload;

pub use document::{
    ApiMessage, DocumentDetail, DocumentId, DocumentListResponse, DocumentStatus,
    DocumentSummary, UnknownStatus, UserRef,
};
pub use upload::UploadForm;
