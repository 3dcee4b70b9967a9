//! Per-frame animation of the streamline pool.
//!
//! Every tick each streamline contributes the one segment under its cursor,
//! then the cursor moves forward, wrapping back to the start of the polyline.
//! Older segments are not redrawn; the surface fades them out instead.

use crate::classify::DisplayMode;
use crate::streamline::Streamline;
use geo::Point;
use riverflow_types::color::Rgba;

/// Width used when a destination point carries no width.
pub const MIN_LINE_WIDTH: f64 = 0.1;

/// One line to stroke this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub width: f64,
    pub color: Rgba,
}

/// Everything a renderer needs for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Surface size in pixels
    pub width: u32,
    pub height: u32,
    /// Wipe the surface before fading (set after a reset)
    pub clear: bool,
    /// Alpha kept from the previous frame
    pub fade_alpha: f64,
    pub segments: Vec<Segment>,
}

/// A drawing surface owned by the host application.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    /// Multiply existing contents' alpha by `alpha`.
    fn fade(&mut self, alpha: f64);
    fn stroke(&mut self, segment: &Segment);
}

impl Frame {
    /// Replay this frame onto a surface: resize, optional clear, fade, strokes.
    pub fn paint<S: Surface + ?Sized>(&self, surface: &mut S) {
        if surface.size() != (self.width, self.height) {
            surface.resize(self.width, self.height);
        }
        if self.clear {
            surface.clear();
        }
        surface.fade(self.fade_alpha);
        for segment in &self.segments {
            surface.stroke(segment);
        }
    }
}

impl Streamline {
    /// The segment under the cursor, styled from its destination point.
    pub fn segment(&self, display: DisplayMode) -> Segment {
        let a = &self.points[self.cursor];
        let b = &self.points[self.cursor + 1];
        Segment {
            from: Point::new(a.x, a.y),
            to: Point::new(b.x, b.y),
            width: display.width(b.w.unwrap_or(MIN_LINE_WIDTH), b.order),
            color: display.color(b.f, b.average, b.order),
        }
    }

    /// Move the cursor one segment forward, wrapping at the last point.
    pub fn advance(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.points.len() - 1 {
            self.cursor = 0;
        }
    }
}

/// Collect this tick's segments and advance every cursor.
pub fn step_pool(pool: &mut [Streamline], display: DisplayMode) -> Vec<Segment> {
    pool.iter_mut()
        .map(|streamline| {
            let segment = streamline.segment(display);
            streamline.advance();
            segment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamline::StreamlinePoint;

    fn polyline(len: usize) -> Vec<StreamlinePoint> {
        (0..len)
            .map(|i| StreamlinePoint {
                x: i as f64,
                y: 0.0,
                w: if i == 0 { None } else { Some(0.2 + i as f64 / 10.0) },
                f: 1000.0 * i as f64,
                average: Some(1000.0),
                order: Some(3 + i as u8),
            })
            .collect()
    }

    #[test]
    fn test_cursor_wraps_after_len_minus_one_ticks() {
        for len in 2..8 {
            let mut s = Streamline::new(polyline(len), 0).unwrap();
            for _ in 0..len - 1 {
                s.advance();
            }
            assert_eq!(s.cursor(), 0, "length {}", len);
        }
    }

    #[test]
    fn test_cursor_never_reaches_last_point() {
        let mut s = Streamline::new(polyline(5), 3).unwrap();
        for _ in 0..20 {
            assert!(s.cursor() + 1 < s.len());
            s.segment(DisplayMode::Plain);
            s.advance();
        }
    }

    #[test]
    fn test_segment_uses_destination_width() {
        let s = Streamline::new(polyline(4), 0).unwrap();
        let seg = s.segment(DisplayMode::Plain);
        assert_eq!(seg.from, Point::new(0.0, 0.0));
        assert_eq!(seg.to, Point::new(1.0, 0.0));
        assert_eq!(seg.width, 0.2 + 0.1);
        assert_eq!(seg.color, Rgba::TRANSLUCENT_WHITE);
    }

    #[test]
    fn test_segment_color_follows_display_mode() {
        let s = Streamline::new(polyline(4), 1).unwrap();
        // destination flow 2000 against average 1000 -> ratio 2 -> deepest blue
        assert_eq!(s.segment(DisplayMode::Comparison).color, Rgba::opaque(0, 0, 255));
        assert_eq!(s.segment(DisplayMode::Flow).color, Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn test_segment_stream_order_style() {
        let s = Streamline::new(polyline(8), 5).unwrap();
        // destination order 9 -> green, width 2
        let seg = s.segment(DisplayMode::StreamOrder);
        assert_eq!(seg.color, Rgba::opaque(0, 255, 0));
        assert_eq!(seg.width, 2.0);

        // destination order 10 has no style
        let s = Streamline::new(polyline(8), 6).unwrap();
        let seg = s.segment(DisplayMode::StreamOrder);
        assert_eq!(seg.color, Rgba::TRANSLUCENT_WHITE);
        assert_eq!(seg.width, crate::classify::UNSTYLED_ORDER_WIDTH);
    }

    #[test]
    fn test_step_pool_advances_everything() {
        let mut pool = vec![
            Streamline::new(polyline(3), 0).unwrap(),
            Streamline::new(polyline(4), 2).unwrap(),
        ];
        let segments = step_pool(&mut pool, DisplayMode::Plain);
        assert_eq!(segments.len(), 2);
        assert_eq!(pool[0].cursor(), 1);
        assert_eq!(pool[1].cursor(), 0);
    }

    #[derive(Default)]
    struct Log {
        size: (u32, u32),
        calls: Vec<String>,
    }

    impl Surface for Log {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.calls.push(format!("resize {}x{}", width, height));
        }
        fn clear(&mut self) {
            self.calls.push("clear".to_string());
        }
        fn fade(&mut self, alpha: f64) {
            self.calls.push(format!("fade {}", alpha));
        }
        fn stroke(&mut self, _segment: &Segment) {
            self.calls.push("stroke".to_string());
        }
    }

    #[test]
    fn test_paint_order() {
        let s = Streamline::new(polyline(3), 0).unwrap();
        let frame = Frame {
            width: 40,
            height: 30,
            clear: true,
            fade_alpha: 0.9,
            segments: vec![s.segment(DisplayMode::Plain)],
        };
        let mut log = Log::default();
        frame.paint(&mut log);
        assert_eq!(log.calls, vec!["resize 40x30", "clear", "fade 0.9", "stroke"]);

        log.calls.clear();
        Frame { clear: false, ..frame }.paint(&mut log);
        assert_eq!(log.calls, vec!["fade 0.9", "stroke"]);
    }
}
