//! Rectangle geometry
//!
//! Plain integer rectangles used for monitors, spots and window frames.
//! Width and height are signed so placement arithmetic (centering slack,
//! border subtraction) never has to juggle casts.

use serde::{Deserialize, Serialize};

/// Window or screen-region geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Center point, rounded towards the origin.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// True when the two rectangles share a non-empty area, or are the same
    /// degenerate rectangle.
    pub fn intersects(&self, other: &Geometry) -> bool {
        overlap(self.x, self.width, other.x, other.width)
            && overlap(self.y, self.height, other.y, other.height)
    }

    /// True when the 1x1 box at the point lies inside this rectangle.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.intersects(&Geometry::new(x, y, 1, 1))
    }
}

/// One-dimensional overlap of the spans `[a, a+b)` and `[c, c+d)`.
pub fn overlap(a: i32, b: i32, c: i32, d: i32) -> bool {
    let (a, b, c, d) = (i64::from(a), i64::from(b), i64::from(c), i64::from(d));
    (a == c && b == d) || (a + b).min(c + d) - a.max(c) > 0
}
