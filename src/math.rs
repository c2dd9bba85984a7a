//! Percentage-space geometry. Every coordinate in this module is a percent
//! of the canvas, `0.0` at the top-left corner and `100.0` at the far edge.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl From<(f64, f64)> for Dimensions {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Where a card goes: its top-left corner and a tilt in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    #[serde(rename = "rotate")]
    pub rotation_degrees: f64,
}

impl Placement {
    pub fn new(left: f64, top: f64, rotation_degrees: f64) -> Self {
        Self {
            left,
            top,
            rotation_degrees,
        }
    }

    /// The rectangle a card of `card` size covers at this placement.
    pub fn rect(&self, card: Dimensions) -> PlacementRect {
        PlacementRect {
            left: self.left,
            top: self.top,
            right: self.left + card.width,
            bottom: self.top + card.height,
        }
    }
}

/// Axis-aligned rectangle covered by a placed card.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlacementRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlacementRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    /// Separating-axis test. Rectangles that only touch along an edge do
    /// not intersect.
    pub fn intersects(&self, other: &PlacementRect) -> bool {
        !(self.right <= other.left
            || self.left >= other.right
            || self.bottom <= other.top
            || self.top >= other.bottom)
    }

    /// True when `self` comes closer than `margin` to `other`.
    pub fn collides(&self, other: &PlacementRect, margin: f64) -> bool {
        self.intersects(&other.expanded(margin))
    }

    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// Range a card's top-left corner may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeRegion {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl SafeRegion {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Pulls `(left, top)` into the region. `f64::clamp` would panic on an
    /// inverted region, so the bounds are applied one at a time.
    pub fn clamp(&self, left: f64, top: f64) -> (f64, f64) {
        (
            left.min(self.max_x).max(self.min_x),
            top.min(self.max_y).max(self.min_y),
        )
    }

    pub fn contains(&self, left: f64, top: f64) -> bool {
        left >= self.min_x && left <= self.max_x && top >= self.min_y && top <= self.max_y
    }
}

impl Default for SafeRegion {
    fn default() -> Self {
        Self::new(6.0, 78.0, 10.0, 80.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_follows_card_size() {
        let rect = Placement::new(10.0, 20.0, 3.0).rect(Dimensions::new(16.0, 10.0));
        assert_eq!(rect, PlacementRect::new(10.0, 20.0, 26.0, 30.0));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = PlacementRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PlacementRect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.collides(&b, 0.5));
    }

    #[test]
    fn disjoint_on_one_axis_is_enough() {
        let a = PlacementRect::new(0.0, 0.0, 10.0, 10.0);
        let below = PlacementRect::new(2.0, 30.0, 8.0, 40.0);
        assert!(!a.collides(&below, 1.2));

        let overlapping = PlacementRect::new(5.0, 5.0, 15.0, 15.0);
        assert!(a.intersects(&overlapping));
        assert!(overlapping.intersects(&a));
    }

    #[test]
    fn clamp_pulls_into_region() {
        let region = SafeRegion::default();
        assert_eq!(region.clamp(-5.0, 200.0), (6.0, 80.0));
        assert_eq!(region.clamp(40.0, 40.0), (40.0, 40.0));
        assert!(region.contains(6.0, 80.0));
        assert!(!region.contains(5.9, 40.0));
    }
}
