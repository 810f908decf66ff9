use std::path::PathBuf;

use thiserror::Error;

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("could not open {path:?}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },
    #[error("page {index} out of range (page_count={page_count})")]
    PageOutOfRange { index: usize, page_count: usize },
    #[error("failed to render page {index}: {reason}")]
    Render { index: usize, reason: String },
    #[error("no document is open")]
    NoDocument,
}
