use image::{Rgba, RgbaImage};
use pdfview_core::{NormalizedRect, RenderImage, SearchHighlights};

const OTHER_COLOR: [u8; 3] = [255, 200, 0];
const OTHER_ALPHA: f32 = 0.2;
const CURRENT_COLOR: [u8; 3] = [255, 235, 0];
const CURRENT_ALPHA: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// Returns a copy of `base` with search hits tinted; the current hit is drawn
/// over the others with a stronger tint. `None` when the bitmap is malformed.
pub fn composite_highlights(
    base: &RenderImage,
    highlights: &SearchHighlights,
) -> Option<RenderImage> {
    let mut canvas = RgbaImage::from_raw(base.width, base.height, base.pixels.clone())?;
    if highlights.is_empty() {
        return Some(base.clone());
    }

    for rect in &highlights.others {
        if let Some(rect) = to_pixel_rect(*rect, base.width, base.height) {
            fill_rect(&mut canvas, rect, OTHER_COLOR, OTHER_ALPHA);
        }
    }
    for rect in &highlights.current {
        if let Some(rect) = to_pixel_rect(*rect, base.width, base.height) {
            fill_rect(&mut canvas, rect, CURRENT_COLOR, CURRENT_ALPHA);
        }
    }

    Some(RenderImage {
        width: base.width,
        height: base.height,
        pixels: canvas.into_raw(),
    })
}

fn to_pixel_rect(rect: NormalizedRect, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (width_f, height_f) = (width as f32, height as f32);
    let x0 = (rect.left * width_f).floor().clamp(0.0, width_f) as u32;
    let x1 = (rect.right * width_f).ceil().clamp(0.0, width_f) as u32;
    let y0 = (rect.top * height_f).floor().clamp(0.0, height_f) as u32;
    let y1 = (rect.bottom * height_f).ceil().clamp(0.0, height_f) as u32;

    (x1 > x0 && y1 > y0).then_some(PixelRect { x0, y0, x1, y1 })
}

fn fill_rect(canvas: &mut RgbaImage, rect: PixelRect, color: [u8; 3], alpha: f32) {
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            blend_pixel(canvas.get_pixel_mut(x, y), color, alpha);
        }
    }
}

fn blend_pixel(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (channel, target) in pixel.0.iter_mut().take(3).zip(color) {
        let blended = f32::from(*channel) * (1.0 - alpha) + f32::from(target) * alpha;
        *channel = blended.round().clamp(0.0, 255.0) as u8;
    }
    pixel.0[3] = 255;
}
