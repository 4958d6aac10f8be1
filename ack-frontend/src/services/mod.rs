pub mod document_client;

pub use document_client::{DocumentApi, DocumentClient};
