use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use pdfium_render::prelude::*;
use pdfview_core::{
    DocumentBackend, DocumentInfo, DocumentProvider, NormalizedRect, PageSize, RenderImage,
    RenderRequest, Rotation, SearchHit, ViewerError, ViewerResult,
};
use tracing::{debug, info, instrument, warn};

/// Directory or library file checked before the working directory and the system library.
pub const PDFIUM_PATH_ENV: &str = "PDFVIEW_PDFIUM_PATH";

pub struct PdfiumProvider {
    pdfium: &'static Pdfium,
}

impl PdfiumProvider {
    pub fn new() -> Result<Self> {
        let pdfium = bind_pdfium()?;
        // Pdfium lives as long as the process; documents borrow it for 'static.
        Ok(Self {
            pdfium: Box::leak(Box::new(pdfium)),
        })
    }
}

impl DocumentProvider for PdfiumProvider {
    #[instrument(skip(self))]
    fn open(&self, path: &Path) -> ViewerResult<Box<dyn DocumentBackend>> {
        let open_error = |reason: String| ViewerError::DocumentOpen {
            path: path.to_path_buf(),
            reason,
        };
        let absolute = path
            .canonicalize()
            .map_err(|err| open_error(err.to_string()))?;
        let document = self
            .pdfium
            .load_pdf_from_file(&absolute, None)
            .map_err(|err| open_error(err.to_string()))?;
        let info = build_document_info(&document, absolute);
        Ok(Box::new(PdfiumDocument { info, document }))
    }
}

struct PdfiumDocument {
    info: DocumentInfo,
    document: PdfDocument<'static>,
}

impl PdfiumDocument {
    fn page(&self, page_index: usize) -> ViewerResult<PdfPage<'_>> {
        let out_of_range = || ViewerError::PageOutOfRange {
            index: page_index,
            page_count: self.info.page_count,
        };
        let index: PdfPageIndex = page_index.try_into().map_err(|_| out_of_range())?;
        self.document.pages().get(index).map_err(|_| out_of_range())
    }
}

impl DocumentBackend for PdfiumDocument {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn page_size(&self, page_index: usize) -> ViewerResult<PageSize> {
        let page = self.page(page_index)?;
        Ok(PageSize::new(page.width().value, page.height().value))
    }

    #[instrument(skip(self))]
    fn render_page(&self, request: RenderRequest) -> ViewerResult<RenderImage> {
        let render_error = |reason: String| ViewerError::Render {
            index: request.page_index,
            reason,
        };
        let page = self.page(request.page_index)?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(request.zoom.max(0.01))
            .rotate(render_rotation(request.rotation), true);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| render_error(err.to_string()))?;
        let pixels = bitmap.as_image().to_rgba8().into_raw();
        let width = u32::try_from(bitmap.width()).unwrap_or_default();
        let height = u32::try_from(bitmap.height()).unwrap_or_default();
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(render_error(format!(
                "bitmap size mismatch: {} bytes for {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        debug!(width, height, "page rasterized");

        Ok(RenderImage {
            width,
            height,
            pixels,
        })
    }

    fn search_page(&self, page_index: usize, query: &str) -> ViewerResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let search_error = |reason: String| ViewerError::Render {
            index: page_index,
            reason: format!("text search failed: {reason}"),
        };

        let page = self.page(page_index)?;
        let text = page.text().map_err(|err| search_error(err.to_string()))?;
        let options = PdfSearchOptions::new().match_case(false);
        let search = text
            .search(query, &options)
            .map_err(|err| search_error(err.to_string()))?;

        let page_width = page.width().value;
        let page_height = page.height().value;
        if page_width <= 0.0 || page_height <= 0.0 {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        while let Some(segments) = search.find_next() {
            let rects: Vec<NormalizedRect> = segments
                .iter()
                .filter_map(|segment| {
                    let bounds = segment.bounds();
                    normalize_bounds(
                        bounds.left().value,
                        bounds.top().value,
                        bounds.right().value,
                        bounds.bottom().value,
                        page_width,
                        page_height,
                    )
                })
                .collect();
            if !rects.is_empty() {
                hits.push(SearchHit { rects });
            }
        }
        debug!(page = page_index, hits = hits.len(), "search finished");
        Ok(hits)
    }
}

/// Converts a rectangle in PDF user space (origin bottom-left) into page-relative
/// coordinates with the origin at the top-left.
fn normalize_bounds(
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    page_width: f32,
    page_height: f32,
) -> Option<NormalizedRect> {
    if page_width <= 0.0 || page_height <= 0.0 {
        return None;
    }
    let rect = NormalizedRect {
        left: left / page_width,
        top: 1.0 - top / page_height,
        right: right / page_width,
        bottom: 1.0 - bottom / page_height,
    }
    .clamp();
    rect.is_valid().then_some(rect)
}

fn render_rotation(rotation: Rotation) -> PdfPageRenderRotation {
    match rotation {
        Rotation::Deg0 => PdfPageRenderRotation::None,
        Rotation::Deg90 => PdfPageRenderRotation::Degrees90,
        Rotation::Deg180 => PdfPageRenderRotation::Degrees180,
        Rotation::Deg270 => PdfPageRenderRotation::Degrees270,
    }
}

fn build_document_info(document: &PdfDocument<'_>, path: PathBuf) -> DocumentInfo {
    let page_count = usize::try_from(document.pages().len()).unwrap_or_default();
    DocumentInfo { path, page_count }
}

/// Library paths to try, in order, before falling back to the system library.
fn library_candidates(env_value: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        let path = PathBuf::from(value);
        if path.is_dir() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(&path));
        } else {
            candidates.push(path);
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));
    candidates
}

fn bind_pdfium() -> Result<Pdfium> {
    let env_value = env::var(PDFIUM_PATH_ENV).ok();
    let mut errors = Vec::new();

    for candidate in library_candidates(env_value.as_deref()) {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                info!(path = %candidate.display(), "bound pdfium");
                return Ok(Pdfium::new(bindings));
            }
            Err(err) => {
                debug!(path = %candidate.display(), ?err, "pdfium candidate rejected");
                errors.push(format!("{}: {}", candidate.display(), err));
            }
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            info!("bound system pdfium");
            Ok(Pdfium::new(bindings))
        }
        Err(err) => {
            errors.push(format!("system: {err}"));
            warn!("no pdfium library available");
            Err(anyhow!(
                "failed to bind to a pdfium library; install it or set {} ({})",
                PDFIUM_PATH_ENV,
                errors.join(", ")
            ))
        }
    }
}
