use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// The visible part of the map: a map-space extent drawn onto a pixel canvas.
///
/// Map space has y growing north, screen space has y growing down with the
/// origin at the top-left pixel.
///
/// # Examples
///
/// ```
/// use riverflow_types::viewport::Viewport;
/// use geo::Point;
///
/// let viewport = Viewport::new(-100.0, 30.0, -90.0, 40.0, 1000, 1000);
/// let top_left = viewport.to_screen(&Point::new(-100.0, 40.0));
/// assert_eq!((top_left.x(), top_left.y()), (0.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Map-space extent
    pub extent: Rect,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a viewport from map-space bounds and a pixel size.
    ///
    /// # Arguments
    ///
    /// * `min_x` - Minimum map x coordinate (west)
    /// * `min_y` - Minimum map y coordinate (south)
    /// * `max_x` - Maximum map x coordinate (east)
    /// * `max_y` - Maximum map y coordinate (north)
    /// * `width` - Canvas width in pixels
    /// * `height` - Canvas height in pixels
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, width: u32, height: u32) -> Self {
        Self {
            extent: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
            width,
            height,
        }
    }

    /// A viewport whose map space is its own pixel space (y still flips).
    pub fn pixels(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64, width, height)
    }

    pub fn min_x(&self) -> f64 {
        self.extent.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.extent.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.extent.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.extent.max().y
    }

    /// True when there is nothing to draw on.
    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.extent.width() <= 0.0
            || self.extent.height() <= 0.0
    }

    /// Map units per pixel along x.
    pub fn resolution_x(&self) -> f64 {
        self.extent.width() / self.width as f64
    }

    /// Map units per pixel along y.
    pub fn resolution_y(&self) -> f64 {
        self.extent.height() / self.height as f64
    }

    /// Project a map-space point to screen pixels.
    pub fn to_screen(&self, point: &Point) -> Point {
        Point::new(
            (point.x() - self.min_x()) / self.resolution_x(),
            (self.max_y() - point.y()) / self.resolution_y(),
        )
    }

    /// Project a screen pixel back to map space.
    pub fn to_map(&self, screen: &Point) -> Point {
        Point::new(
            self.min_x() + screen.x() * self.resolution_x(),
            self.max_y() - screen.y() * self.resolution_y(),
        )
    }

    /// Check if a map-space point lies inside the extent (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x() >= self.min_x()
            && point.x() <= self.max_x()
            && point.y() >= self.min_y()
            && point.y() <= self.max_y()
    }

    /// Pixel size as a `(width, height)` pair.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
