use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::file::{self, FileInfo};
use crate::{
    DocumentProvider, FitMode, NormalizedRect, PdfHandler, RenderImage, Rotation, SearchHit,
    ViewerConfig, ViewerError, ViewerResult,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub page: usize,
    pub zoom: f32,
    pub rotation: Rotation,
    pub fit_mode: FitMode,
    pub search: Option<SearchCursor>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: 0,
            zoom: 1.0,
            rotation: Rotation::Deg0,
            fit_mode: FitMode::None,
            search: None,
        }
    }
}

/// Results of the last search on `page` and the hit the user is looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCursor {
    pub query: String,
    pub page: usize,
    pub hits: Vec<SearchHit>,
    pub current: usize,
}

impl SearchCursor {
    /// Highlight boxes in the coordinate space of a page rendered with `rotation`.
    pub fn highlights(&self, rotation: Rotation) -> SearchHighlights {
        let mut highlights = SearchHighlights::default();
        for (idx, hit) in self.hits.iter().enumerate() {
            let target = if idx == self.current {
                &mut highlights.current
            } else {
                &mut highlights.others
            };
            target.extend(hit.rects.iter().map(|rect| rect.rotated(rotation)));
        }
        highlights
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHighlights {
    pub current: Vec<NormalizedRect>,
    pub others: Vec<NormalizedRect>,
}

impl SearchHighlights {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.others.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open { path: PathBuf },
    Close,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GotoPage { page: usize },
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SetFitMode { mode: FitMode },
    Rotate,
    Resize { width: f32, height: f32 },
    Search { query: String },
    SearchNext,
    SearchPrev,
}

/// Everything the status bar shows, pushed after every successful render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    /// 1-based; 0 when no document is open.
    pub page: usize,
    pub page_count: usize,
    pub zoom: Option<f32>,
    pub fit_mode: FitMode,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    DocumentOpened(FileInfoSummary),
    DocumentClosed,
    PageRendered {
        image: RenderImage,
        highlights: SearchHighlights,
    },
    HighlightsChanged(SearchHighlights),
    StatusChanged(StatusSnapshot),
    Message(String),
    Error { title: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfoSummary {
    pub name: String,
    pub path: PathBuf,
    pub size: String,
}

impl From<&FileInfo> for FileInfoSummary {
    fn from(info: &FileInfo) -> Self {
        Self {
            name: info.name.clone(),
            path: info.path.clone(),
            size: info.display_size(),
        }
    }
}

pub struct Controller {
    handler: PdfHandler,
    state: ViewState,
    config: ViewerConfig,
    viewport: (f32, f32),
    file: Option<FileInfo>,
    events: Vec<ViewerEvent>,
}

impl Controller {
    pub fn new(provider: Box<dyn DocumentProvider>, config: ViewerConfig) -> Self {
        let handler = PdfHandler::new(provider, config.zoom_bounds());
        Self {
            handler,
            state: ViewState::default(),
            config,
            viewport: (0.0, 0.0),
            file: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn file(&self) -> Option<&FileInfo> {
        self.file.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.handler.is_open()
    }

    pub fn page_count(&self) -> usize {
        self.handler.page_count()
    }

    pub fn can_go_previous(&self) -> bool {
        self.handler.is_open() && self.state.page > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.handler.is_open() && self.state.page + 1 < self.handler.page_count()
    }

    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply(&mut self, command: Command) {
        debug!(?command, "apply");
        match command {
            Command::Open { path } => {
                // failures are already reported through an Error event
                let _ = self.open_file(&path);
            }
            Command::Close => self.close(),
            Command::NextPage => self.next_page(),
            Command::PrevPage => self.prev_page(),
            Command::FirstPage => self.first_page(),
            Command::LastPage => self.last_page(),
            Command::GotoPage { page } => self.goto_page(page),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::ResetZoom => self.reset_zoom(),
            Command::SetFitMode { mode } => self.set_fit_mode(mode),
            Command::Rotate => self.rotate(),
            Command::Resize { width, height } => self.resize_viewport(width, height),
            Command::Search { query } => self.search(&query),
            Command::SearchNext => self.search_next(),
            Command::SearchPrev => self.search_prev(),
        }
    }

    pub fn open_file(&mut self, path: &Path) -> ViewerResult<()> {
        match self.try_open(path) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to open document");
                self.events.push(ViewerEvent::Error {
                    title: "Error".into(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn try_open(&mut self, path: &Path) -> ViewerResult<()> {
        if !file::validate(path) {
            return Err(ViewerError::DocumentOpen {
                path: path.to_path_buf(),
                reason: "not a PDF file".into(),
            });
        }
        let info = file::get_file_info(path).map_err(|err| ViewerError::DocumentOpen {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        })?;
        self.handler.open(path)?;

        info!(file = %info.name, size = info.size, "opened");
        self.state = ViewState {
            fit_mode: self.config.initial_fit_mode,
            ..ViewState::default()
        };
        self.events.push(ViewerEvent::DocumentOpened(FileInfoSummary::from(&info)));
        self.file = Some(info);
        self.refresh();
        self.message("Document loaded successfully");
        Ok(())
    }

    pub fn close(&mut self) {
        if !self.handler.is_open() {
            return;
        }
        self.handler.close();
        self.state = ViewState::default();
        self.file = None;
        self.events.push(ViewerEvent::DocumentClosed);
        self.push_status();
        self.message("Document closed");
    }

    pub fn next_page(&mut self) {
        if !self.require_document() {
            return;
        }
        if !self.can_go_next() {
            self.message("Already at the last page");
            return;
        }
        self.move_to(self.state.page + 1);
    }

    pub fn prev_page(&mut self) {
        if !self.require_document() {
            return;
        }
        if !self.can_go_previous() {
            self.message("Already at the first page");
            return;
        }
        self.move_to(self.state.page - 1);
    }

    pub fn first_page(&mut self) {
        if !self.require_document() {
            return;
        }
        if self.state.page == 0 {
            self.message("Already at the first page");
            return;
        }
        self.move_to(0);
    }

    pub fn last_page(&mut self) {
        if !self.require_document() {
            return;
        }
        let last = self.handler.page_count().saturating_sub(1);
        if self.state.page == last {
            self.message("Already at the last page");
            return;
        }
        self.move_to(last);
    }

    /// `page` is 0-based; out-of-range targets leave the state untouched.
    pub fn goto_page(&mut self, page: usize) {
        if !self.require_document() {
            return;
        }
        let page_count = self.handler.page_count();
        if page >= page_count {
            self.message(format!(
                "Page {} is out of range (1-{})",
                page.saturating_add(1),
                page_count
            ));
            return;
        }
        if page != self.state.page {
            self.move_to(page);
        }
    }

    pub fn zoom_in(&mut self) {
        let factor = self.config.zoom_step;
        self.scale_by(factor);
    }

    pub fn zoom_out(&mut self) {
        let factor = 1.0 / self.config.zoom_step;
        self.scale_by(factor);
    }

    pub fn reset_zoom(&mut self) {
        if !self.require_document() {
            return;
        }
        self.state.fit_mode = FitMode::None;
        self.state.zoom = self.handler.bounds().clamp(1.0);
        self.refresh();
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) {
        if !self.require_document() {
            return;
        }
        self.state.fit_mode = mode;
        self.refresh();
    }

    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        let viewport = (width.max(0.0), height.max(0.0));
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if self.handler.is_open() && self.state.fit_mode.is_active() {
            self.refresh();
        }
    }

    pub fn rotate(&mut self) {
        if !self.require_document() {
            return;
        }
        self.state.rotation = self.state.rotation.next();
        self.refresh();
    }

    pub fn search(&mut self, query: &str) {
        if !self.require_document() {
            return;
        }
        let query = query.trim();
        if query.is_empty() {
            if self.state.search.take().is_some() {
                self.events
                    .push(ViewerEvent::HighlightsChanged(SearchHighlights::default()));
            }
            return;
        }

        let hits = match self.handler.search_text(self.state.page, query) {
            Ok(hits) => hits,
            Err(err) => {
                warn!(%err, "search failed");
                self.message(format!("Search failed: {err}"));
                return;
            }
        };

        if hits.is_empty() {
            self.state.search = None;
            self.events
                .push(ViewerEvent::HighlightsChanged(SearchHighlights::default()));
            self.message(format!("'{query}': no matches on this page"));
            return;
        }

        let total = hits.len();
        self.state.search = Some(SearchCursor {
            query: query.to_owned(),
            page: self.state.page,
            hits,
            current: 0,
        });
        self.push_highlights();
        self.message(format!(
            "Found {total} {} of '{query}'",
            if total == 1 { "match" } else { "matches" }
        ));
    }

    pub fn search_next(&mut self) {
        self.step_search(1);
    }

    pub fn search_prev(&mut self) {
        self.step_search(-1);
    }

    fn step_search(&mut self, delta: isize) {
        let Some(cursor) = self.state.search.as_mut() else {
            self.message("No active search");
            return;
        };
        let last = cursor.hits.len().saturating_sub(1) as isize;
        let next = (cursor.current as isize + delta).clamp(0, last) as usize;
        if next == cursor.current {
            let edge = if delta > 0 { "last" } else { "first" };
            self.message(format!("Already at the {edge} match"));
            return;
        }
        cursor.current = next;
        let (current, total) = (next + 1, cursor.hits.len());
        self.push_highlights();
        self.message(format!("Match {current} of {total}"));
    }

    fn scale_by(&mut self, factor: f32) {
        if !self.require_document() {
            return;
        }
        let bounds = self.handler.bounds();
        let current = self.effective_zoom();
        let next = bounds.clamp(current * factor);
        self.state.fit_mode = FitMode::None;
        if (next - current).abs() <= f32::EPSILON {
            self.state.zoom = next;
            let edge = if factor > 1.0 { "maximum" } else { "minimum" };
            self.message(format!("Zoom is already at the {edge}"));
            self.push_status();
            return;
        }
        self.state.zoom = next;
        self.refresh();
    }

    fn move_to(&mut self, page: usize) {
        self.state.page = page;
        if self.state.search.take().is_some() {
            debug!("page changed, dropping search cursor");
        }
        self.refresh();
    }

    /// Zoom used for the next render: the fit result when a fit mode is active
    /// and the viewport is known, otherwise the stored zoom.
    fn effective_zoom(&self) -> f32 {
        let (width, height) = self.viewport;
        let fitted = self
            .handler
            .compute_fit_zoom(
                self.state.page,
                self.state.fit_mode,
                width,
                height,
                self.state.rotation,
            )
            .unwrap_or_else(|err| {
                warn!(%err, "fit computation failed");
                None
            });
        self.handler.bounds().clamp(fitted.unwrap_or(self.state.zoom))
    }

    fn refresh(&mut self) {
        if !self.handler.is_open() {
            return;
        }
        let zoom = self.effective_zoom();
        self.state.zoom = zoom;
        match self
            .handler
            .render_page(self.state.page, zoom, self.state.rotation)
        {
            Ok(image) => {
                let highlights = self.current_highlights();
                self.events
                    .push(ViewerEvent::PageRendered { image, highlights });
                self.push_status();
            }
            Err(err) => {
                warn!(%err, page = self.state.page, "render failed");
                self.message(format!(
                    "Error rendering page {}: {err}",
                    self.state.page + 1
                ));
            }
        }
    }

    fn current_highlights(&self) -> SearchHighlights {
        self.state
            .search
            .as_ref()
            .filter(|cursor| cursor.page == self.state.page)
            .map(|cursor| cursor.highlights(self.state.rotation))
            .unwrap_or_default()
    }

    fn push_highlights(&mut self) {
        let highlights = self.current_highlights();
        self.events.push(ViewerEvent::HighlightsChanged(highlights));
    }

    fn push_status(&mut self) {
        let snapshot = self.status_snapshot();
        self.events.push(ViewerEvent::StatusChanged(snapshot));
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        if !self.handler.is_open() {
            return StatusSnapshot::default();
        }
        StatusSnapshot {
            file_name: self.file.as_ref().map(|f| f.name.clone()),
            file_size: self.file.as_ref().map(|f| f.display_size()),
            page: self.state.page + 1,
            page_count: self.handler.page_count(),
            zoom: Some(self.state.zoom),
            fit_mode: self.state.fit_mode,
            rotation: self.state.rotation,
        }
    }

    fn require_document(&mut self) -> bool {
        if self.handler.is_open() {
            true
        } else {
            self.message("No document open");
            false
        }
    }

    fn message(&mut self, message: impl Into<String>) {
        self.events.push(ViewerEvent::Message(message.into()));
    }
}
