use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::{FitMode, ZoomBounds};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    /// Pixels moved by one arrow key press.
    pub scroll_step: f32,
    pub initial_fit_mode: FitMode,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_min: ZoomBounds::DEFAULT.min,
            zoom_max: ZoomBounds::DEFAULT.max,
            zoom_step: 1.25,
            scroll_step: 40.0,
            initial_fit_mode: FitMode::None,
            window_width: 1000.0,
            window_height: 700.0,
        }
    }
}

impl ViewerConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: ViewerConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !positive(self.zoom_min) || !self.zoom_max.is_finite() {
            bail!("zoom bounds must be positive and finite");
        }
        if self.zoom_min >= self.zoom_max {
            bail!(
                "zoom_min ({}) must be below zoom_max ({})",
                self.zoom_min,
                self.zoom_max
            );
        }
        if self.zoom_step.is_nan() || self.zoom_step <= 1.0 {
            bail!("zoom_step must be greater than 1.0, got {}", self.zoom_step);
        }
        if !positive(self.scroll_step) {
            bail!("scroll_step must be positive");
        }
        if !positive(self.window_width) || !positive(self.window_height) {
            bail!("window size must be positive");
        }
        Ok(())
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds {
            min: self.zoom_min,
            max: self.zoom_max,
        }
    }
}

/// False for zero, negatives and NaN.
fn positive(value: f32) -> bool {
    value > 0.0
}
