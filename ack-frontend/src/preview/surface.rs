use crate::preview::backend::PageImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const PREVIEW_FAILED_MESSAGE: &str = "Sorry, could not display preview.";

/// What the preview's render area currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RenderArea {
    #[default]
    Closed,
    Loading,
    /// Pages rendered so far, in order. `complete` once the last page is in.
    Pages { pages: Vec<PageImage>, complete: bool },
    /// Terminal failure. Never shown alongside partial pages.
    Failed { message: String },
}

#[derive(Default)]
struct SurfaceState {
    owner: Option<u64>,
    area: RenderArea,
}

/// The visible render area, owned by one selection generation at a time.
/// Writes from any other generation are ignored.
#[derive(Clone, Default)]
pub struct RenderSurface {
    inner: Arc<Mutex<SurfaceState>>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, generation: u64, f: impl FnOnce(&mut RenderArea)) -> bool {
        let mut state = self.lock();
        if state.owner != Some(generation) {
            return false;
        }
        f(&mut state.area);
        true
    }

    /// Hand the surface to `generation` and show the loading state.
    /// Generations only move forward; an older render cannot take it back.
    pub fn begin(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.owner.is_some_and(|owner| owner > generation) {
            return false;
        }
        state.owner = Some(generation);
        state.area = RenderArea::Loading;
        true
    }

    pub fn start_pages(&self, generation: u64) -> bool {
        self.update(generation, |area| {
            *area = RenderArea::Pages {
                pages: Vec::new(),
                complete: false,
            }
        })
    }

    pub fn append(&self, generation: u64, page: PageImage) -> bool {
        let mut appended = false;
        self.update(generation, |area| {
            if let RenderArea::Pages {
                pages,
                complete: false,
            } = area
            {
                pages.push(page);
                appended = true;
            }
        });
        appended
    }

    pub fn finish(&self, generation: u64) -> bool {
        self.update(generation, |area| {
            if let RenderArea::Pages { complete, .. } = area {
                *complete = true;
            }
        })
    }

    pub fn fail(&self, generation: u64) -> bool {
        self.update(generation, |area| {
            *area = RenderArea::Failed {
                message: PREVIEW_FAILED_MESSAGE.to_string(),
            }
        })
    }

    /// Blank the area. Ownership is kept so older renders stay locked out.
    pub fn clear(&self) {
        self.lock().area = RenderArea::Closed;
    }

    pub fn area(&self) -> RenderArea {
        self.lock().area.clone()
    }

    /// The area as seen by `generation`; `Closed` if another generation owns it.
    pub fn area_for(&self, generation: u64) -> RenderArea {
        let state = self.lock();
        if state.owner == Some(generation) {
            state.area.clone()
        } else {
            RenderArea::Closed
        }
    }
}
