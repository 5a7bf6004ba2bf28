//! Viewer state machine: pagination and zoom for the selected document.

use serde::Serialize;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Per-document viewer state. All transitions are synchronous and never fail; the
/// boolean they return says whether anything changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewerState {
    #[default]
    NoDocument,
    #[serde(rename_all = "camelCase")]
    Viewing {
        document_url: String,
        page: u32,
        page_count: u32,
        zoom: f64,
    },
}

fn round_zoom(zoom: f64) -> f64 {
    ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM)
}

impl ViewerState {
    /// Fresh state for a newly selected document: page 1, unknown page count, zoom 1.0.
    pub fn open(document_url: impl Into<String>) -> Self {
        ViewerState::Viewing {
            document_url: document_url.into(),
            page: 1,
            page_count: 0,
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Record the page count reported by the renderer for `url`.
    ///
    /// Ignored unless `url` is the document being viewed.
    pub fn document_loaded(&mut self, url: &str, count: u32) -> bool {
        match self {
            ViewerState::Viewing {
                document_url,
                page,
                page_count,
                ..
            } if document_url == url => {
                *page = (*page).min(count.max(1));
                *page_count = count;
                true
            }
            _ => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        match self {
            ViewerState::Viewing {
                page, page_count, ..
            } if *page < *page_count => {
                *page += 1;
                true
            }
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        match self {
            ViewerState::Viewing { page, .. } if *page > 1 => {
                *page -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_by(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_by(-ZOOM_STEP)
    }

    fn zoom_by(&mut self, delta: f64) -> bool {
        match self {
            ViewerState::Viewing { zoom, .. } => {
                let next = round_zoom(*zoom + delta);
                let changed = next != *zoom;
                *zoom = next;
                changed
            }
            ViewerState::NoDocument => false,
        }
    }

    pub fn deselect(&mut self) -> bool {
        let was_viewing = self.is_viewing();
        *self = ViewerState::NoDocument;
        was_viewing
    }

    pub fn is_viewing(&self) -> bool {
        matches!(self, ViewerState::Viewing { .. })
    }

    pub fn document_url(&self) -> Option<&str> {
        match self {
            ViewerState::Viewing { document_url, .. } => Some(document_url),
            ViewerState::NoDocument => None,
        }
    }

    pub fn page(&self) -> Option<u32> {
        match self {
            ViewerState::Viewing { page, .. } => Some(*page),
            ViewerState::NoDocument => None,
        }
    }

    pub fn page_count(&self) -> Option<u32> {
        match self {
            ViewerState::Viewing { page_count, .. } => Some(*page_count),
            ViewerState::NoDocument => None,
        }
    }

    pub fn zoom(&self) -> Option<f64> {
        match self {
            ViewerState::Viewing { zoom, .. } => Some(*zoom),
            ViewerState::NoDocument => None,
        }
    }

    /// Zoom as a whole percentage, as shown in the toolbar.
    pub fn zoom_percent(&self) -> Option<u32> {
        self.zoom().map(|zoom| (zoom * 100.0).round() as u32)
    }

    pub fn can_go_next(&self) -> bool {
        matches!(self, ViewerState::Viewing { page, page_count, .. } if page < page_count)
    }

    pub fn can_go_prev(&self) -> bool {
        matches!(self, ViewerState::Viewing { page, .. } if *page > 1)
    }
}
