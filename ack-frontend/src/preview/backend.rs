use crate::error::RenderError;
use async_trait::async_trait;

/// One rendered page. `png` holds the complete image; partial pages are never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number.
    pub number: u32,
    pub png: Vec<u8>,
}

/// Paginated rendering capability. Implementations decide the format they accept.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open(&self, bytes: Vec<u8>) -> Result<Box<dyn OpenedDocument>, RenderError>;
}

/// A parsed document, rendered one page at a time.
#[async_trait]
pub trait OpenedDocument: Send + Sync {
    fn page_count(&self) -> u32;

    async fn render_page(&self, number: u32, scale: f32) -> Result<PageImage, RenderError>;
}
