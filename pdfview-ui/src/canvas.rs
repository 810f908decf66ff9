use egui::{
    pos2, vec2, Color32, ColorImage, Context, Event, MouseWheelUnit, PointerButton, Rect, Sense,
    TextureHandle, TextureOptions, Ui, Vec2,
};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use pdfview_core::{RenderImage, SearchHighlights};
use tracing::{debug, warn};

use crate::highlight::composite_highlights;
use crate::scroll::{Overscroll, ScrollAnchor, ScrollRegion};

const BACKGROUND: Color32 = Color32::from_gray(96);
/// Touchpad travel, in points, that counts as one wheel notch.
const POINTS_PER_NOTCH: f32 = 50.0;

/// What happened on the canvas during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasResponse {
    pub viewport: Vec2,
    pub overscroll: Overscroll,
}

/// Shows one rendered page and keeps both the bitmap and its texture alive
/// while it is on screen.
#[derive(Default)]
pub struct Canvas {
    base: Option<RenderImage>,
    texture: Option<TextureHandle>,
    region: ScrollRegion,
    wheel_pending: f32,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the displayed page and resets the scroll region to its size.
    pub fn display(&mut self, ctx: &Context, image: RenderImage, anchor: ScrollAnchor) {
        self.region.set_content(image.width as f32, image.height as f32, anchor);
        self.upload(ctx, &image);
        self.base = Some(image);
    }

    /// Redraws the current page with `highlights` tinted over it.
    pub fn set_highlights(&mut self, ctx: &Context, highlights: &SearchHighlights) {
        let Some(base) = self.base.as_ref() else {
            return;
        };
        match composite_highlights(base, highlights) {
            Some(image) => self.upload(ctx, &image),
            None => warn!(
                width = base.width,
                height = base.height,
                "bitmap does not match its size; highlights skipped"
            ),
        }
    }

    pub fn clear(&mut self) {
        self.base = None;
        self.texture = None;
        self.region.clear();
        self.wheel_pending = 0.0;
    }

    pub fn scroll(&mut self, dx: f32, dy: f32) -> Overscroll {
        if self.base.is_none() {
            return Overscroll::None;
        }
        self.region.scroll(dx, dy)
    }

    pub fn pan_start(&mut self, x: f32, y: f32) {
        self.region.pan_start(x, y);
    }

    pub fn pan_move(&mut self, x: f32, y: f32) {
        self.region.pan_move(x, y);
    }

    /// Fills the remaining space of `ui`, handling wheel scrolling and
    /// middle-button panning.
    pub fn show(&mut self, ui: &mut Ui) -> CanvasResponse {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.region.set_viewport(rect.width(), rect.height());

        // Page turns follow wheel notches; the smoothed delta, which egui
        // spreads over many frames, only moves within the page.
        let mut overscroll = Overscroll::None;
        if response.hovered() && self.base.is_some() {
            let pending = &mut self.wheel_pending;
            let (delta, notch) = ui.input(|input| {
                (input.smooth_scroll_delta, wheel_notch(&input.events, pending))
            });
            if let Some(direction) = notch {
                overscroll = self.region.edge_overscroll(direction);
            }
            if delta != Vec2::ZERO {
                self.region.scroll_within(-delta.x, -delta.y);
            }
        }

        if response.drag_started_by(PointerButton::Middle) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pan_start(pos.x, pos.y);
            }
        } else if response.dragged_by(PointerButton::Middle) {
            if let Some(pos) = response.interact_pointer_pos() {
                self.pan_move(pos.x, pos.y);
            }
        }
        if response.drag_stopped() {
            self.region.pan_end();
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        if let Some(texture) = &self.texture {
            let (origin_x, origin_y) = self.region.origin();
            let (width, height) = self.region.content();
            let image_rect =
                Rect::from_min_size(rect.min + vec2(origin_x, origin_y), vec2(width, height));
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture.id(), image_rect, uv, Color32::WHITE);
        }

        CanvasResponse {
            viewport: rect.size(),
            overscroll,
        }
    }

    fn upload(&mut self, ctx: &Context, image: &RenderImage) {
        let max_side = ctx.input(|input| input.max_texture_side);
        let Some(color_image) = to_color_image(image, max_side) else {
            warn!(
                width = image.width,
                height = image.height,
                "bitmap does not match its size; texture not updated"
            );
            return;
        };
        if let Some(texture) = self.texture.as_mut() {
            texture.set(color_image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture("page", color_image, TextureOptions::LINEAR));
        }
    }
}

/// Vertical direction of the last wheel notch in `events`, positive towards the
/// end of the page. Continuous deltas count once they add up to a notch.
fn wheel_notch(events: &[Event], pending: &mut f32) -> Option<f32> {
    let mut notch = None;
    for event in events {
        let Event::MouseWheel {
            unit,
            delta,
            modifiers,
        } = event
        else {
            continue;
        };
        if modifiers.command || modifiers.ctrl || delta.y == 0.0 {
            continue;
        }
        match unit {
            MouseWheelUnit::Point => {
                *pending -= delta.y;
                if pending.abs() >= POINTS_PER_NOTCH {
                    notch = Some(pending.signum());
                    *pending = 0.0;
                }
            }
            MouseWheelUnit::Line | MouseWheelUnit::Page => {
                *pending = 0.0;
                notch = Some(-delta.y.signum());
            }
        }
    }
    notch
}

/// Converts a bitmap to an egui image, downsampling it when a side exceeds
/// what the GPU accepts. The canvas still lays it out at full size.
fn to_color_image(image: &RenderImage, max_side: usize) -> Option<ColorImage> {
    let rgba = RgbaImage::from_raw(image.width, image.height, image.pixels.clone())?;
    let (width, height) = (image.width as usize, image.height as usize);
    let longest = width.max(height);
    if longest == 0 {
        return None;
    }
    if max_side == 0 || longest <= max_side {
        return Some(ColorImage::from_rgba_unmultiplied([width, height], rgba.as_raw()));
    }

    let scale = max_side as f32 / longest as f32;
    let target_w = ((width as f32 * scale).floor() as u32).max(1);
    let target_h = ((height as f32 * scale).floor() as u32).max(1);
    debug!(width, height, target_w, target_h, "downsampling page texture");
    let resized = imageops::resize(&rgba, target_w, target_h, FilterType::Triangle);
    Some(ColorImage::from_rgba_unmultiplied(
        [target_w as usize, target_h as usize],
        resized.as_raw(),
    ))
}
