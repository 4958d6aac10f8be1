use std::path::Path;
use validator::{Validate, ValidationError};

/// File types the server accepts (office documents are converted to PDF server-side).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "xlsx"];

/// Multipart upload form. Kept by the caller on failure so it can be corrected and resent.
#[derive(Debug, Clone, Validate)]
pub struct UploadForm {
    #[validate(
        length(min = 1, message = "A file name is required"),
        custom(function = "validate_extension")
    )]
    pub filename: String,
    pub content_type: String,
    #[validate(length(min = 1, message = "File is empty"))]
    pub data: Vec<u8>,
    pub special_requirements: String,
}

impl UploadForm {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_string();
        Self {
            filename,
            content_type,
            data,
            special_requirements: String::new(),
        }
    }

    pub fn with_special_requirements(mut self, text: impl Into<String>) -> Self {
        self.special_requirements = text.into();
        self
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, data))
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

fn validate_extension(filename: &str) -> Result<(), ValidationError> {
    match extension(filename) {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => {
            let mut err = ValidationError::new("unsupported_file_type");
            err.message = Some("Only PDF, DOCX and XLSX files can be uploaded".into());
            Err(err)
        }
    }
}
