//! HTTP client for the document API.
//!
//! The server owns storage, conversion and the signature records; this client
//! only consumes its JSON contract. Authentication is a cookie session opened
//! by [`DocumentClient::login`].

use crate::config::ApiSettings;
use crate::error::{AcknowledgeError, ClientError, NetworkError, UploadError};
use crate::models::{
    ApiMessage, DocumentDetail, DocumentId, DocumentListResponse, DocumentSummary, UploadForm,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use secrecy::ExposeSecret;
use service_core::observability::TracedClientExt;
use validator::Validate;

/// The consumed server contract. Workflow components depend on this trait so
/// they can run against any transport.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// `GET /api/documents`
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, NetworkError>;

    /// `GET /api/documents/{id}`
    async fn get_document(&self, id: DocumentId) -> Result<DocumentDetail, NetworkError>;

    /// `POST /api/documents` (multipart)
    async fn upload_document(&self, form: &UploadForm) -> Result<(), UploadError>;

    /// `POST /api/documents/{id}/sign`
    async fn acknowledge(&self, id: DocumentId) -> Result<(), AcknowledgeError>;

    /// `DELETE /api/documents/{id}`
    async fn delete_document(&self, id: DocumentId) -> Result<(), NetworkError>;

    /// Raw bytes behind a detail's source locator (`GET /uploads/{locator}`).
    async fn fetch_source(&self, locator: &str) -> Result<Vec<u8>, NetworkError>;

    /// `GET /download/signed/{id}`: the stored document as an attachment.
    async fn download_document(&self, id: DocumentId) -> Result<Vec<u8>, NetworkError>;
}

pub struct DocumentClient {
    client: Client,
    settings: ApiSettings,
    base_url: String,
}

impl DocumentClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ClientError> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::BaseUrl(settings.base_url.clone()));
        }

        let client = Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a cookie session with the configured credentials.
    ///
    /// The login form redirects back to itself on bad credentials, so a final
    /// URL ending in `/login` counts as a failure.
    pub async fn login(&self) -> Result<(), ClientError> {
        let (Some(username), Some(password)) = (&self.settings.username, &self.settings.password)
        else {
            tracing::debug!("No credentials configured, skipping login");
            return Ok(());
        };

        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .traced_post(&url)
            .form(&[
                ("username", username.as_str()),
                ("password", password.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send login request to {}: {}", url, e);
                ClientError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() || response.url().path().ends_with("/login") {
            tracing::warn!(username = %username, status = %status, "Login rejected");
            return Err(ClientError::Login(status));
        }

        tracing::info!(username = %username, "Session established");
        Ok(())
    }

    fn document_url(&self, id: DocumentId) -> String {
        format!("{}/api/documents/{}", self.base_url, id)
    }

    fn download_url(&self, id: DocumentId) -> String {
        format!("{}/download/signed/{}", self.base_url, id)
    }

    fn source_url(&self, locator: &str) -> String {
        format!(
            "{}/uploads/{}",
            self.base_url,
            locator.trim_start_matches('/')
        )
    }
}

/// Status and server-provided message of a non-2xx response.
async fn rejection(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let message = response
        .json::<ApiMessage>()
        .await
        .ok()
        .and_then(ApiMessage::into_text)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    (status, message)
}

fn ensure_success(response: Response, url: &str) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(NetworkError::Status {
            status,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl DocumentApi for DocumentClient {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, NetworkError> {
        let url = format!("{}/api/documents", self.base_url);
        let response = self.client.traced_get(&url).send().await?;
        let list: DocumentListResponse = ensure_success(response, &url)?.json().await?;

        tracing::debug!(count = list.documents.len(), "Fetched document list");
        Ok(list.documents)
    }

    async fn get_document(&self, id: DocumentId) -> Result<DocumentDetail, NetworkError> {
        let url = self.document_url(id);
        let response = self.client.traced_get(&url).send().await?;
        let detail = ensure_success(response, &url)?.json().await?;
        Ok(detail)
    }

    async fn upload_document(&self, form: &UploadForm) -> Result<(), UploadError> {
        form.validate()?;

        let file = Part::bytes(form.data.clone())
            .file_name(form.filename.clone())
            .mime_str(&form.content_type)?;
        let multipart = Form::new()
            .part("file", file)
            .text("special_requirements", form.special_requirements.clone());

        let url = format!("{}/api/documents", self.base_url);
        let response = self
            .client
            .traced_post(&url)
            .multipart(multipart)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(file_name = %form.filename, "File uploaded successfully");
            return Ok(());
        }

        let (status, message) = rejection(response).await;
        tracing::error!(
            file_name = %form.filename,
            status = %status,
            message = %message,
            "Upload failed"
        );
        Err(UploadError::Rejected { status, message })
    }

    async fn acknowledge(&self, id: DocumentId) -> Result<(), AcknowledgeError> {
        let url = format!("{}/sign", self.document_url(id));
        let response = self.client.traced_post(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::CONFLICT {
            // The server keeps one acknowledgment per user and document.
            tracing::info!(document_id = id, "Document was already acknowledged");
            return Ok(());
        }

        let (status, message) = rejection(response).await;
        Err(AcknowledgeError::Rejected { status, message })
    }

    async fn delete_document(&self, id: DocumentId) -> Result<(), NetworkError> {
        let url = self.document_url(id);
        let response = self.client.traced_delete(&url).send().await?;
        ensure_success(response, &url)?;
        Ok(())
    }

    async fn fetch_source(&self, locator: &str) -> Result<Vec<u8>, NetworkError> {
        let url = self.source_url(locator);
        let response = self.client.traced_get(&url).send().await?;
        let bytes = ensure_success(response, &url)?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn download_document(&self, id: DocumentId) -> Result<Vec<u8>, NetworkError> {
        let url = self.download_url(id);
        let response = self.client.traced_get(&url).send().await?;
        let bytes = ensure_success(response, &url)?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
