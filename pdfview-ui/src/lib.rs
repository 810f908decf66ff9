mod canvas;
mod highlight;
mod input;
mod scroll;
mod status;

pub use canvas::{Canvas, CanvasResponse};
pub use highlight::composite_highlights;
pub use input::{EventMapper, UiEvent};
pub use scroll::{Overscroll, ScrollAnchor, ScrollRegion};
pub use status::StatusBar;
