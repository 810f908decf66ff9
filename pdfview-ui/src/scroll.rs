/// Where the vertical scroll position lands when new content is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAnchor {
    #[default]
    Top,
    Bottom,
    Keep,
}

/// Result of a scroll request that could not move any further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overscroll {
    None,
    PastStart,
    PastEnd,
}

const EDGE_EPSILON: f32 = 0.5;

/// Scroll geometry of a single image inside a viewport, in logical pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollRegion {
    viewport: (f32, f32),
    content: (f32, f32),
    offset: (f32, f32),
    pan_last: Option<(f32, f32)>,
}

impl ScrollRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> (f32, f32) {
        self.content
    }

    pub fn offset(&self) -> (f32, f32) {
        self.offset
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(0.0), height.max(0.0));
        self.clamp_offset();
    }

    pub fn set_content(&mut self, width: f32, height: f32, anchor: ScrollAnchor) {
        self.content = (width.max(0.0), height.max(0.0));
        match anchor {
            ScrollAnchor::Top => self.offset = (0.0, 0.0),
            ScrollAnchor::Bottom => self.offset = (0.0, f32::MAX),
            ScrollAnchor::Keep => {}
        }
        self.clamp_offset();
    }

    pub fn clear(&mut self) {
        self.content = (0.0, 0.0);
        self.offset = (0.0, 0.0);
        self.pan_last = None;
    }

    pub fn max_offset(&self) -> (f32, f32) {
        (
            (self.content.0 - self.viewport.0).max(0.0),
            (self.content.1 - self.viewport.1).max(0.0),
        )
    }

    /// Top-left corner of the content relative to the viewport. Content smaller
    /// than the viewport is centred on that axis.
    pub fn origin(&self) -> (f32, f32) {
        let axis = |content: f32, viewport: f32, offset: f32| {
            if content < viewport {
                ((viewport - content) / 2.0).floor()
            } else {
                -offset
            }
        };
        (
            axis(self.content.0, self.viewport.0, self.offset.0),
            axis(self.content.1, self.viewport.1, self.offset.1),
        )
    }

    /// Moves the view by `(dx, dy)`; positive values scroll towards the end.
    /// Reports an overscroll only when the view already rests on the vertical
    /// edge the request points at.
    pub fn scroll(&mut self, dx: f32, dy: f32) -> Overscroll {
        let overscroll = self.edge_overscroll(dy);
        if overscroll == Overscroll::None {
            self.shift(dx, dy);
        } else {
            self.shift(dx, 0.0);
        }
        overscroll
    }

    /// Moves the view without reporting edges.
    pub fn scroll_within(&mut self, dx: f32, dy: f32) {
        self.shift(dx, dy);
    }

    /// Whether a vertical move of `dy` would push past the edge the view rests on.
    pub fn edge_overscroll(&self, dy: f32) -> Overscroll {
        let (_, max_y) = self.max_offset();
        if dy > 0.0 && self.offset.1 >= max_y - EDGE_EPSILON {
            Overscroll::PastEnd
        } else if dy < 0.0 && self.offset.1 <= EDGE_EPSILON {
            Overscroll::PastStart
        } else {
            Overscroll::None
        }
    }

    pub fn pan_start(&mut self, x: f32, y: f32) {
        self.pan_last = Some((x, y));
    }

    /// Drags the content along with the pointer.
    pub fn pan_move(&mut self, x: f32, y: f32) {
        if let Some((last_x, last_y)) = self.pan_last {
            self.shift(last_x - x, last_y - y);
            self.pan_last = Some((x, y));
        }
    }

    pub fn pan_end(&mut self) {
        self.pan_last = None;
    }

    fn shift(&mut self, dx: f32, dy: f32) {
        self.offset.0 += dx;
        self.offset.1 += dy;
        self.clamp_offset();
    }

    fn clamp_offset(&mut self) {
        let (max_x, max_y) = self.max_offset();
        self.offset.0 = self.offset.0.clamp(0.0, max_x);
        self.offset.1 = self.offset.1.clamp(0.0, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(content: (f32, f32)) -> ScrollRegion {
        let mut region = ScrollRegion::new();
        region.set_viewport(400.0, 300.0);
        region.set_content(content.0, content.1, ScrollAnchor::Top);
        region
    }

    #[test]
    fn small_content_is_centered() {
        let region = region((200.0, 100.0));
        assert_eq!(region.origin(), (100.0, 100.0));
        assert_eq!(region.max_offset(), (0.0, 0.0));
    }

    #[test]
    fn scroll_offset_never_leaves_the_region() {
        let mut region = region((800.0, 1000.0));
        assert_eq!(region.scroll(5000.0, 200.0), Overscroll::None);
        assert_eq!(region.offset(), (400.0, 200.0));
        assert_eq!(region.scroll(0.0, 5000.0), Overscroll::None);
        assert_eq!(region.offset().1, 700.0);
        assert_eq!(region.origin(), (-400.0, -700.0));
        assert_eq!(region.scroll(-9000.0, -9000.0), Overscroll::None);
        assert_eq!(region.offset(), (0.0, 0.0));
    }

    #[test]
    fn overscroll_is_reported_only_at_vertical_edges() {
        let mut region = region((400.0, 600.0));
        assert_eq!(region.scroll(0.0, -10.0), Overscroll::PastStart);
        assert_eq!(region.scroll(0.0, 150.0), Overscroll::None);
        assert_eq!(region.scroll(0.0, -10.0), Overscroll::None);
        assert_eq!(region.scroll(0.0, 400.0), Overscroll::None);
        assert_eq!(region.offset().1, 300.0);
        assert_eq!(region.scroll(0.0, 10.0), Overscroll::PastEnd);
        assert_eq!(region.offset().1, 300.0);
    }

    #[test]
    fn content_that_fits_overscrolls_both_ways() {
        let mut region = region((300.0, 200.0));
        assert_eq!(region.scroll(0.0, 1.0), Overscroll::PastEnd);
        assert_eq!(region.scroll(0.0, -1.0), Overscroll::PastStart);
        assert_eq!(region.scroll(30.0, 0.0), Overscroll::None);
    }

    #[test]
    fn edge_check_and_inner_scroll_do_not_move_past_edges() {
        let mut region = region((400.0, 600.0));
        assert_eq!(region.edge_overscroll(1.0), Overscroll::None);
        assert_eq!(region.edge_overscroll(-1.0), Overscroll::PastStart);
        region.scroll_within(0.0, 1000.0);
        assert_eq!(region.offset().1, 300.0);
        assert_eq!(region.edge_overscroll(1.0), Overscroll::PastEnd);
        assert_eq!(region.edge_overscroll(0.0), Overscroll::None);
    }

    #[test]
    fn anchor_bottom_starts_at_the_end_and_keep_clamps() {
        let mut region = region((400.0, 1000.0));
        region.set_content(400.0, 1000.0, ScrollAnchor::Bottom);
        assert_eq!(region.offset().1, 700.0);

        region.set_content(400.0, 500.0, ScrollAnchor::Keep);
        assert_eq!(region.offset().1, 200.0);
    }

    #[test]
    fn shrinking_the_viewport_keeps_offset_valid() {
        let mut region = region((800.0, 800.0));
        region.scroll(300.0, 400.0);
        region.set_viewport(700.0, 700.0);
        assert_eq!(region.offset(), (100.0, 100.0));
    }

    #[test]
    fn panning_follows_the_pointer_and_stops_after_release() {
        let mut region = region((1000.0, 1000.0));
        region.pan_start(200.0, 200.0);
        region.pan_move(150.0, 120.0);
        assert_eq!(region.offset(), (50.0, 80.0));
        region.pan_move(250.0, 120.0);
        assert_eq!(region.offset(), (0.0, 80.0));
        region.pan_end();
        region.pan_move(0.0, 0.0);
        assert_eq!(region.offset(), (0.0, 80.0));
    }
}
