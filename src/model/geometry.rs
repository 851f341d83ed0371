//! Axis-aligned rectangles in page space.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in top-left-origin page coordinates.
///
/// `y0` is the top edge and `y1` the bottom edge, so sorting by `y0`
/// ascending walks a page from top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle, normalizing swapped corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Create a rectangle from an origin and a size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// A rectangle with no area.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Center point as `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Whether the point lies inside or on the boundary.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Whether the two rectangles share a region of positive area.
    ///
    /// Empty rectangles never intersect anything, and rectangles that only
    /// touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let r = Rect::new(10.0, 50.0, 0.0, 20.0);
        assert_eq!(r, Rect::new(0.0, 20.0, 10.0, 50.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 30.0);
    }

    #[test]
    fn test_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&Rect::new(50.0, 50.0, 150.0, 150.0)));
        assert!(a.intersects(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!a.intersects(&Rect::new(100.0, 0.0, 200.0, 100.0)));
        assert!(!a.intersects(&Rect::new(0.0, 200.0, 100.0, 300.0)));
    }

    #[test]
    fn test_empty_rect_never_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let line = Rect::new(0.0, 50.0, 100.0, 50.0);
        assert!(line.is_empty());
        assert!(!a.intersects(&line));
    }

    #[test]
    fn test_union_and_center() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 30.0, 40.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 30.0, 40.0));
        assert_eq!(u.center(), (15.0, 20.0));
        assert!(u.contains_point(15.0, 20.0));
        assert!(!u.contains_point(31.0, 20.0));
    }
}
