pub mod backend;
pub mod executor;
pub mod pdftoppm;
pub mod renderer;
pub mod surface;

pub use backend::{OpenedDocument, PageImage, RenderBackend};
pub use pdftoppm::PdftoppmBackend;
pub use renderer::{PreviewRenderer, RenderOutcome};
pub use surface::{PREVIEW_FAILED_MESSAGE, RenderArea, RenderSurface};
