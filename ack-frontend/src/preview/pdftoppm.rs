use crate::config::PreviewSettings;
use crate::error::RenderError;
use crate::preview::backend::{OpenedDocument, PageImage, RenderBackend};
use crate::preview::executor::CommandExecutor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Renders PDFs with poppler's `pdfinfo` and `pdftoppm`.
///
/// The server converts office uploads to PDF, so every source locator points
/// at a PDF.
pub struct PdftoppmBackend {
    executor: CommandExecutor,
    settings: PreviewSettings,
}

impl PdftoppmBackend {
    pub fn new(settings: PreviewSettings) -> Self {
        Self {
            executor: CommandExecutor::new(settings.command_timeout()),
            settings,
        }
    }
}

#[async_trait]
impl RenderBackend for PdftoppmBackend {
    async fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn OpenedDocument>, RenderError> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(RenderError::Open("not a PDF document".to_string()));
        }

        let work_dir = self.settings.temp_dir();
        tokio::fs::create_dir_all(&work_dir).await?;
        let path = work_dir.join(format!("preview-{}.pdf", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes).await?;

        // The file is removed when `document` drops, including on the error path.
        let mut document = OpenedPdf {
            path,
            work_dir,
            page_count: 0,
            executor: self.executor.clone(),
            pdftoppm_bin: self.settings.pdftoppm_bin.clone(),
        };

        let info = self
            .executor
            .execute(&self.settings.pdfinfo_bin, &[path_str(&document.path)?])
            .await
            .map_err(|e| RenderError::Open(e.to_string()))?;
        document.page_count = parse_page_count(&info.stdout)?;

        tracing::debug!(pages = document.page_count, "Opened PDF for preview");
        Ok(Box::new(document))
    }
}

struct OpenedPdf {
    path: PathBuf,
    work_dir: PathBuf,
    page_count: u32,
    executor: CommandExecutor,
    pdftoppm_bin: String,
}

#[async_trait]
impl OpenedDocument for OpenedPdf {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn render_page(&self, number: u32, scale: f32) -> Result<PageImage, RenderError> {
        let dpi = ((72.0 * scale).round() as u32).max(1).to_string();
        let page = number.to_string();
        let prefix = self
            .work_dir
            .join(format!("page-{}-{}", Uuid::new_v4(), number));

        self.executor
            .execute(
                &self.pdftoppm_bin,
                &[
                    "-f",
                    &page,
                    "-l",
                    &page,
                    "-r",
                    &dpi,
                    "-png",
                    "-singlefile",
                    path_str(&self.path)?,
                    path_str(&prefix)?,
                ],
            )
            .await
            .map_err(|e| RenderError::Page {
                page: number,
                message: e.to_string(),
            })?;

        let output = prefix.with_extension("png");
        let png = tokio::fs::read(&output).await;
        let _ = tokio::fs::remove_file(&output).await;

        Ok(PageImage {
            number,
            png: png.map_err(|e| RenderError::Page {
                page: number,
                message: e.to_string(),
            })?,
        })
    }
}

impl Drop for OpenedPdf {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn path_str(path: &Path) -> Result<&str, RenderError> {
    path.to_str()
        .ok_or_else(|| RenderError::Open(format!("non UTF-8 path: {}", path.display())))
}

fn parse_page_count(output: &[u8]) -> Result<u32, RenderError> {
    let output = String::from_utf8_lossy(output);

    output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .ok_or_else(|| RenderError::Open("page count not found in pdfinfo output".to_string()))?
        .trim()
        .parse::<u32>()
        .map_err(|e| RenderError::Open(format!("failed to parse page count: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_read_from_pdfinfo() {
        let output = b"Title:          Handbook\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output).unwrap(), 12);
    }

    #[test]
    fn missing_page_count_is_an_open_error() {
        let result = parse_page_count(b"Syntax Error: Couldn't find trailer dictionary\n");
        assert!(matches!(result, Err(RenderError::Open(_))));
    }

    #[tokio::test]
    async fn non_pdf_bytes_fail_to_open() {
        let backend = PdftoppmBackend::new(PreviewSettings::default());
        let result = backend.open(b"PK\x03\x04 not a pdf".to_vec()).await;
        assert!(matches!(result, Err(RenderError::Open(_))));
    }
}
