//! Incremental page-by-page preview rendering.
//!
//! A render fetches the raw bytes behind a detail's source locator, opens
//! them with the configured [`RenderBackend`] and then pulls pages from a
//! [`PageStream`] one at a time, appending each to the [`RenderSurface`].
//! The selection's cancellation token stops the stream between pages and no
//! page is appended once it fires.

use crate::error::RenderError;
use crate::preview::backend::{OpenedDocument, PageImage, RenderBackend};
use crate::preview::surface::{RenderArea, RenderSurface};
use crate::services::DocumentApi;
use crate::workflow::session::Selection;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lazy, finite, single-use sequence of rendered pages in ascending order.
pub type PageStream = BoxStream<'static, Result<PageImage, RenderError>>;

/// Pages of `document`, each render starting only after the previous one
/// completed. Ends early once `cancel` fires.
pub fn page_stream(
    document: Box<dyn OpenedDocument>,
    scale: f32,
    cancel: CancellationToken,
) -> PageStream {
    stream::unfold((document, 1u32), move |(document, next)| {
        let cancel = cancel.clone();
        async move {
            if next > document.page_count() || cancel.is_cancelled() {
                return None;
            }
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                page = document.render_page(next, scale) => page,
            };
            Some((page, (document, next + 1)))
        }
    })
    .boxed()
}

#[derive(Debug)]
pub enum RenderOutcome {
    Completed { pages: u32 },
    /// Superseded or closed; `rendered` pages had been appended.
    Cancelled { rendered: u32 },
    Failed(RenderError),
}

pub struct PreviewRenderer {
    api: Arc<dyn DocumentApi>,
    backend: Arc<dyn RenderBackend>,
    surface: RenderSurface,
    scale: f32,
}

impl PreviewRenderer {
    pub fn new(api: Arc<dyn DocumentApi>, backend: Arc<dyn RenderBackend>, scale: f32) -> Self {
        Self {
            api,
            backend,
            surface: RenderSurface::new(),
            scale,
        }
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Render area as seen by the given selection.
    pub fn area_for(&self, selection: &Selection) -> RenderArea {
        self.surface.area_for(selection.generation)
    }

    async fn open(&self, locator: &str) -> Result<Box<dyn OpenedDocument>, RenderError> {
        let bytes = self.api.fetch_source(locator).await?;
        tracing::debug!(locator = %locator, size = bytes.len(), "Fetched document bytes");
        self.backend.open(bytes).await
    }

    /// Render `locator` for `selection`. Always starts from page 1.
    pub async fn render(&self, locator: &str, selection: &Selection) -> RenderOutcome {
        let generation = selection.generation;
        let cancel = selection.cancellation().clone();
        if cancel.is_cancelled() || !self.surface.begin(generation) {
            return RenderOutcome::Cancelled { rendered: 0 };
        }

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RenderOutcome::Cancelled { rendered: 0 },
            opened = self.open(locator) => opened,
        };

        let document = match opened {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(document_id = selection.id, error = %e, "Could not open document for preview");
                self.surface.fail(generation);
                return RenderOutcome::Failed(e);
            }
        };

        let total = document.page_count();
        tracing::debug!(document_id = selection.id, pages = total, "Rendering preview");
        self.surface.start_pages(generation);

        let mut pages = page_stream(document, self.scale, cancel.clone());
        let mut rendered = 0;

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    if cancel.is_cancelled() || !self.surface.append(generation, page) {
                        return RenderOutcome::Cancelled { rendered };
                    }
                    rendered += 1;
                    metrics::counter!("preview_pages_rendered_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(
                        document_id = selection.id,
                        page = rendered + 1,
                        error = %e,
                        "Page render failed"
                    );
                    self.surface.fail(generation);
                    return RenderOutcome::Failed(e);
                }
            }
        }

        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled { rendered };
        }

        self.surface.finish(generation);
        RenderOutcome::Completed { pages: rendered }
    }
}
