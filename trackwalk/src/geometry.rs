//! Integer board geometry
//!
//! All coordinates are integer board units. Endpoint coincidence is exact
//! integer equality; floating point only appears in lengths and distances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Point in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`. Taken in floating point so opposite
    /// extremes of the coordinate range cannot overflow.
    pub fn delta(self, other: Point) -> (f64, f64) {
        (other.x as f64 - self.x as f64, other.y as f64 - self.y as f64)
    }

    /// Euclidean distance to `other`
    pub fn distance(self, other: Point) -> f64 {
        let (dx, dy) = self.delta(other);
        dx.hypot(dy)
    }

    /// Round floating point coordinates to the nearest board unit
    pub fn rounded(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i64,
            y: y.round() as i64,
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size2D {
    pub width: i64,
    pub height: i64,
}

impl Size2D {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn square(side: i64) -> Self {
        Self::new(side, side)
    }
}

/// Shortest distance from `p` to the closed segment `a`-`b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (vx, vy) = a.delta(b);
    let len_sq = vx * vx + vy * vy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let (px, py) = a.delta(p);
    let t = ((px * vx + py * vy) / len_sq).clamp(0.0, 1.0);
    let cx = a.x as f64 + t * vx;
    let cy = a.y as f64 + t * vy;
    ((p.x as f64) - cx).hypot((p.y as f64) - cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(Point::new(0, 0).distance(Point::new(3, 4)), 5.0);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0, 0);
        let b = Point::new(10, 0);
        assert_eq!(distance_to_segment(Point::new(5, 3), a, b), 3.0);
        // beyond the end the closest point is the endpoint
        assert_eq!(distance_to_segment(Point::new(13, 4), a, b), 5.0);
        assert_eq!(distance_to_segment(Point::new(3, 4), a, a), 5.0);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let left = Point::new(-i64::MAX, 0);
        let right = Point::new(i64::MAX, 0);
        assert_eq!(left.distance(right), 2.0 * i64::MAX as f64);
        assert_eq!(distance_to_segment(Point::new(0, 0), left, right), 0.0);
        assert_eq!(right - left, Point::new(i64::MAX, 0));
        assert_eq!(Point::new(i64::MIN, 0) + Point::new(-1, 0), Point::new(i64::MIN, 0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Point::rounded(2.5, -2.4), Point::new(3, -2));
    }
}
