use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub mod config;
pub mod controller;
pub mod error;
pub mod file;
pub mod fit;
pub mod handler;

pub use config::ViewerConfig;
pub use controller::{
    Command, Controller, FileInfoSummary, SearchCursor, SearchHighlights, StatusSnapshot,
    ViewState, ViewerEvent,
};
pub use error::{ViewerError, ViewerResult};
pub use file::FileInfo;
pub use fit::{fit_zoom, ZoomBounds};
pub use handler::PdfHandler;

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub page_count: usize,
}

/// Natural page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size as seen on screen after applying `rotation`.
    pub fn rotated(self, rotation: Rotation) -> Self {
        if rotation.swaps_axes() {
            Self {
                width: self.height,
                height: self.width,
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next clockwise quarter turn.
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    #[default]
    None,
    FitWidth,
    FitHeight,
    FitPage,
}

impl FitMode {
    pub fn is_active(self) -> bool {
        !matches!(self, FitMode::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            FitMode::None => "Manual",
            FitMode::FitWidth => "Fit Width",
            FitMode::FitHeight => "Fit Height",
            FitMode::FitPage => "Fit Page",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: usize,
    pub zoom: f32,
    pub rotation: Rotation,
}

/// Tightly packed RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Rectangle in unrotated page space, each edge in `0.0..=1.0` with the
/// origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl NormalizedRect {
    pub fn clamp(self) -> Self {
        let left = self.left.min(self.right).clamp(0.0, 1.0);
        let right = self.left.max(self.right).clamp(0.0, 1.0);
        let top = self.top.min(self.bottom).clamp(0.0, 1.0);
        let bottom = self.top.max(self.bottom).clamp(0.0, 1.0);
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    /// Maps the rectangle onto a page rendered with a clockwise `rotation`.
    pub fn rotated(self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => self,
            Rotation::Deg90 => Self {
                left: 1.0 - self.bottom,
                top: self.left,
                right: 1.0 - self.top,
                bottom: self.right,
            },
            Rotation::Deg180 => Self {
                left: 1.0 - self.right,
                top: 1.0 - self.bottom,
                right: 1.0 - self.left,
                bottom: 1.0 - self.top,
            },
            Rotation::Deg270 => Self {
                left: self.top,
                top: 1.0 - self.right,
                right: self.bottom,
                bottom: 1.0 - self.left,
            },
        }
    }
}

/// One occurrence of a search query; multi-line matches span several boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub rects: Vec<NormalizedRect>,
}

pub trait DocumentBackend {
    fn info(&self) -> &DocumentInfo;
    fn page_size(&self, page_index: usize) -> ViewerResult<PageSize>;
    fn render_page(&self, request: RenderRequest) -> ViewerResult<RenderImage>;
    /// Case-insensitive search within one page.
    fn search_page(&self, page_index: usize, query: &str) -> ViewerResult<Vec<SearchHit>>;
}

pub trait DocumentProvider {
    fn open(&self, path: &Path) -> ViewerResult<Box<dyn DocumentBackend>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// In-memory document whose pages are all `page` sized.
    pub struct FakeBackend {
        pub info: DocumentInfo,
        pub page: PageSize,
        pub hits: Vec<SearchHit>,
        pub fail_render: Rc<Cell<bool>>,
    }

    impl DocumentBackend for FakeBackend {
        fn info(&self) -> &DocumentInfo {
            &self.info
        }

        fn page_size(&self, page_index: usize) -> ViewerResult<PageSize> {
            if page_index >= self.info.page_count {
                return Err(ViewerError::PageOutOfRange {
                    index: page_index,
                    page_count: self.info.page_count,
                });
            }
            Ok(self.page)
        }

        fn render_page(&self, request: RenderRequest) -> ViewerResult<RenderImage> {
            if self.fail_render.get() {
                return Err(ViewerError::Render {
                    index: request.page_index,
                    reason: "simulated failure".into(),
                });
            }
            let size = self.page.rotated(request.rotation);
            let width = (size.width * request.zoom).round().max(1.0) as u32;
            let height = (size.height * request.zoom).round().max(1.0) as u32;
            Ok(RenderImage {
                width,
                height,
                pixels: vec![request.page_index as u8; 4],
            })
        }

        fn search_page(&self, _page_index: usize, query: &str) -> ViewerResult<Vec<SearchHit>> {
            if query.eq_ignore_ascii_case("needle") {
                Ok(self.hits.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Opens any path whose stem is not `broken` as a document of `page_count` pages.
    pub struct FakeProvider {
        pub page_count: usize,
        pub page: PageSize,
        pub fail_render: Rc<Cell<bool>>,
    }

    impl FakeProvider {
        pub fn new(page_count: usize) -> Self {
            Self {
                page_count,
                page: PageSize::new(600.0, 800.0),
                fail_render: Rc::new(Cell::new(false)),
            }
        }
    }

    impl DocumentProvider for FakeProvider {
        fn open(&self, path: &Path) -> ViewerResult<Box<dyn DocumentBackend>> {
            if path.file_stem().and_then(|s| s.to_str()) == Some("broken") {
                return Err(ViewerError::DocumentOpen {
                    path: path.to_path_buf(),
                    reason: "corrupt xref table".into(),
                });
            }
            let hit = |left: f32| SearchHit {
                rects: vec![NormalizedRect {
                    left,
                    top: 0.1,
                    right: left + 0.1,
                    bottom: 0.15,
                }],
            };
            Ok(Box::new(FakeBackend {
                info: DocumentInfo {
                    path: path.to_path_buf(),
                    page_count: self.page_count,
                },
                page: self.page,
                hits: vec![hit(0.1), hit(0.4), hit(0.7)],
                fail_render: Rc::clone(&self.fail_render),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_back_after_four_turns() {
        let mut rotation = Rotation::Deg0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            rotation = rotation.next();
            seen.push(rotation.degrees());
        }
        assert_eq!(seen, vec![90, 180, 270, 0]);
        assert_eq!(rotation, Rotation::Deg0);
    }

    #[test]
    fn page_size_swaps_axes_for_quarter_turns() {
        let size = PageSize::new(100.0, 200.0);
        assert_eq!(size.rotated(Rotation::Deg90), PageSize::new(200.0, 100.0));
        assert_eq!(size.rotated(Rotation::Deg180), size);
    }

    #[test]
    fn normalized_rect_follows_clockwise_rotation() {
        let rect = NormalizedRect {
            left: 0.0,
            top: 0.0,
            right: 0.2,
            bottom: 0.1,
        };
        // top-left corner moves to the top-right after a clockwise quarter turn
        let quarter = rect.rotated(Rotation::Deg90);
        assert!((quarter.left - 0.9).abs() < 1e-6);
        assert!((quarter.right - 1.0).abs() < 1e-6);
        assert!((quarter.top - 0.0).abs() < 1e-6);
        assert!((quarter.bottom - 0.2).abs() < 1e-6);

        let half = rect.rotated(Rotation::Deg180);
        assert!((half.left - 0.8).abs() < 1e-6);
        assert!((half.bottom - 1.0).abs() < 1e-6);

        let back = rect.rotated(Rotation::Deg90).rotated(Rotation::Deg270);
        assert!((back.left - rect.left).abs() < 1e-6);
        assert!((back.bottom - rect.bottom).abs() < 1e-6);
    }

    #[test]
    fn normalized_rect_clamp_orders_edges() {
        let rect = NormalizedRect {
            left: 0.8,
            top: 1.4,
            right: -0.2,
            bottom: 0.5,
        }
        .clamp();
        assert_eq!(rect.left, 0.0);
        assert_eq!(rect.right, 0.8);
        assert_eq!(rect.top, 0.5);
        assert_eq!(rect.bottom, 1.0);
        assert!(rect.is_valid());
    }
}
