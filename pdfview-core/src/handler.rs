use std::path::Path;

use tracing::{debug, info, instrument};

use crate::{
    fit_zoom, DocumentBackend, DocumentInfo, DocumentProvider, FitMode, PageSize, RenderImage,
    RenderRequest, Rotation, SearchHit, ViewerError, ViewerResult, ZoomBounds,
};

/// Owns the open document and the provider used to open new ones.
pub struct PdfHandler {
    provider: Box<dyn DocumentProvider>,
    document: Option<Box<dyn DocumentBackend>>,
    bounds: ZoomBounds,
}

impl PdfHandler {
    pub fn new(provider: Box<dyn DocumentProvider>, bounds: ZoomBounds) -> Self {
        Self {
            provider,
            document: None,
            bounds,
        }
    }

    /// Replaces the open document. On failure, including a document without
    /// pages, the previous document stays open.
    #[instrument(skip(self))]
    pub fn open(&mut self, path: &Path) -> ViewerResult<&DocumentInfo> {
        let document = self.provider.open(path)?;
        if document.info().page_count == 0 {
            return Err(ViewerError::DocumentOpen {
                path: path.to_path_buf(),
                reason: "document has no pages".into(),
            });
        }
        if let Some(previous) = self.document.take() {
            debug!(path = %previous.info().path.display(), "closing previous document");
        }
        info!(pages = document.info().page_count, "document opened");
        Ok(self.document.insert(document).info())
    }

    pub fn close(&mut self) {
        if let Some(document) = self.document.take() {
            info!(path = %document.info().path.display(), "document closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn info(&self) -> Option<&DocumentInfo> {
        self.document.as_ref().map(|doc| doc.info())
    }

    pub fn page_count(&self) -> usize {
        self.info().map(|info| info.page_count).unwrap_or(0)
    }

    pub fn page_size(&self, index: usize) -> ViewerResult<PageSize> {
        let document = self.checked_document(index)?;
        document.page_size(index)
    }

    #[instrument(skip(self))]
    pub fn render_page(
        &self,
        index: usize,
        zoom: f32,
        rotation: Rotation,
    ) -> ViewerResult<RenderImage> {
        let document = self.checked_document(index)?;
        document.render_page(RenderRequest {
            page_index: index,
            zoom: self.bounds.clamp(zoom),
            rotation,
        })
    }

    pub fn search_text(&self, index: usize, query: &str) -> ViewerResult<Vec<SearchHit>> {
        let document = self.checked_document(index)?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        document.search_page(index, query)
    }

    /// Zoom for `mode` on page `index`; `None` for manual zoom or an empty viewport.
    pub fn compute_fit_zoom(
        &self,
        index: usize,
        mode: FitMode,
        viewport_width: f32,
        viewport_height: f32,
        rotation: Rotation,
    ) -> ViewerResult<Option<f32>> {
        if !mode.is_active() {
            return Ok(None);
        }
        let page = self.page_size(index)?.rotated(rotation);
        Ok(fit_zoom(
            page,
            mode,
            viewport_width,
            viewport_height,
            self.bounds,
        ))
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.bounds
    }

    fn checked_document(&self, index: usize) -> ViewerResult<&dyn DocumentBackend> {
        let document = self.document.as_deref().ok_or(ViewerError::NoDocument)?;
        let page_count = document.info().page_count;
        if index >= page_count {
            return Err(ViewerError::PageOutOfRange { index, page_count });
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing::FakeProvider;

    fn handler(pages: usize) -> PdfHandler {
        PdfHandler::new(Box::new(FakeProvider::new(pages)), ZoomBounds::DEFAULT)
    }

    #[test]
    fn open_reports_page_count() {
        let mut handler = handler(3);
        assert_eq!(handler.page_count(), 0);
        let info = handler.open(Path::new("/docs/a.pdf")).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(handler.page_count(), 3);
    }

    #[test]
    fn failed_open_keeps_previous_document() {
        let mut handler = handler(3);
        handler.open(Path::new("/docs/a.pdf")).unwrap();

        let err = handler.open(Path::new("/docs/broken.pdf")).unwrap_err();
        assert!(matches!(err, ViewerError::DocumentOpen { .. }));
        assert_eq!(
            handler.info().map(|info| info.path.clone()),
            Some(PathBuf::from("/docs/a.pdf"))
        );
    }

    #[test]
    fn document_without_pages_is_rejected() {
        let mut handler = handler(2);
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        handler.provider = Box::new(FakeProvider::new(0));

        match handler.open(Path::new("/docs/empty.pdf")) {
            Err(ViewerError::DocumentOpen { reason, .. }) => {
                assert_eq!(reason, "document has no pages")
            }
            other => panic!("unexpected result: {:?}", other.map(|info| info.page_count)),
        }
        assert_eq!(handler.page_count(), 2);
        assert!(handler.render_page(0, 1.0, Rotation::Deg0).is_ok());
    }

    #[test]
    fn render_rejects_out_of_range_index() {
        let mut handler = handler(2);
        assert!(matches!(
            handler.render_page(0, 1.0, Rotation::Deg0),
            Err(ViewerError::NoDocument)
        ));
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        assert!(handler.render_page(1, 1.0, Rotation::Deg0).is_ok());
        assert!(matches!(
            handler.render_page(2, 1.0, Rotation::Deg0),
            Err(ViewerError::PageOutOfRange {
                index: 2,
                page_count: 2
            })
        ));
    }

    #[test]
    fn render_applies_zoom_and_rotation() {
        let mut handler = handler(1);
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        let image = handler.render_page(0, 0.5, Rotation::Deg90).unwrap();
        assert_eq!((image.width, image.height), (400, 300));
    }

    #[test]
    fn fit_width_render_fills_viewport_width() {
        let mut handler = handler(1);
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        for rotation in [Rotation::Deg0, Rotation::Deg90] {
            let zoom = handler
                .compute_fit_zoom(0, FitMode::FitWidth, 900.0, 500.0, rotation)
                .unwrap()
                .unwrap();
            let image = handler.render_page(0, zoom, rotation).unwrap();
            assert!((image.width as i64 - 900).abs() <= 1);
        }
    }

    #[test]
    fn search_is_case_insensitive_and_ignores_blank_queries() {
        let mut handler = handler(1);
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        assert_eq!(handler.search_text(0, "NeEdLe").unwrap().len(), 3);
        assert!(handler.search_text(0, "haystack").unwrap().is_empty());
        assert!(handler.search_text(0, "   ").unwrap().is_empty());
    }

    #[test]
    fn close_drops_document() {
        let mut handler = handler(1);
        handler.open(Path::new("/docs/a.pdf")).unwrap();
        handler.close();
        assert!(!handler.is_open());
        assert_eq!(handler.page_count(), 0);
    }
}
