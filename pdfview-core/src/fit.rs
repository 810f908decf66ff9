use crate::{FitMode, PageSize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f32,
    pub max: f32,
}

impl ZoomBounds {
    pub const DEFAULT: ZoomBounds = ZoomBounds {
        min: 0.10,
        max: 5.00,
    };

    pub fn clamp(&self, zoom: f32) -> f32 {
        if !zoom.is_finite() {
            return 1.0_f32.clamp(self.min, self.max);
        }
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Zoom that makes `page` (already rotated) fit a viewport of
/// `viewport_width` x `viewport_height` pixels. `None` for manual zoom or
/// when either size is degenerate.
pub fn fit_zoom(
    page: PageSize,
    mode: FitMode,
    viewport_width: f32,
    viewport_height: f32,
    bounds: ZoomBounds,
) -> Option<f32> {
    if page.width <= 0.0 || page.height <= 0.0 {
        return None;
    }
    if viewport_width <= 0.0 || viewport_height <= 0.0 {
        return None;
    }

    let by_width = viewport_width / page.width;
    let by_height = viewport_height / page.height;
    let zoom = match mode {
        FitMode::None => return None,
        FitMode::FitWidth => by_width,
        FitMode::FitHeight => by_height,
        FitMode::FitPage => by_width.min(by_height),
    };
    Some(bounds.clamp(zoom))
}
