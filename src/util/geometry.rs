// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric primitives and coordinate transformations.
//!
//! All editing happens in image pixel coordinates. Label files store
//! box geometry normalized against the image (reference frame) size,
//! and this module converts between the two.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Boxes whose width or height is at or below this are treated as empty.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.dx;
        self.y += rhs.dy;
    }
}

/// Pixel dimensions of the reference frame (the loaded image).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The frame as a rectangle anchored at the origin.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// An axis-aligned rectangle: top-left corner plus non-negative size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle. Negative sizes are flipped so the result always
    /// covers the same area with non-negative width and height.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self { x, y, width, height }
    }

    /// Create the rectangle spanned by two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_edges(a.x, a.y, b.x, b.y)
    }

    /// Create a rectangle from edge positions given in any order.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: left.min(right),
            y: top.min(bottom),
            width: (right - left).abs(),
            height: (bottom - top).abs(),
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Zero (or near-zero) extent in at least one axis.
    pub fn is_degenerate(&self) -> bool {
        self.width <= DEGENERATE_EPSILON || self.height <= DEGENERATE_EPSILON
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Check if a point lies inside the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Check if two rectangles overlap or touch.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    /// The overlapping part of two rectangles, if they overlap at all.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_edges(
            self.left().max(other.left()),
            self.top().max(other.top()),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn translate(&self, delta: Vector) -> Rect {
        Rect {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
            ..*self
        }
    }

    /// Same size, moved so its top-left corner is at `point`.
    pub fn with_top_left(&self, point: Point) -> Rect {
        Rect {
            x: point.x,
            y: point.y,
            ..*self
        }
    }

    /// Same size, moved so its center is at `point`.
    pub fn with_center(&self, point: Point) -> Rect {
        self.with_top_left(Point::new(
            point.x - self.width / 2.0,
            point.y - self.height / 2.0,
        ))
    }

    /// Clamp `delta` so that translating this rectangle keeps it inside
    /// `bounds`. Rectangles larger than the bounds are pinned to the
    /// bounds' top-left corner.
    pub fn clamp_translation(&self, delta: Vector, bounds: &Rect) -> Vector {
        let clamp_axis = |d: f64, lo: f64, hi: f64| {
            if lo > hi {
                lo
            } else {
                d.clamp(lo, hi)
            }
        };
        Vector::new(
            clamp_axis(
                delta.dx,
                bounds.left() - self.left(),
                bounds.right() - self.right(),
            ),
            clamp_axis(
                delta.dy,
                bounds.top() - self.top(),
                bounds.bottom() - self.bottom(),
            ),
        )
    }
}

/// Box geometry as fractions of the reference frame size.
///
/// `cx`/`cy` locate the center, `w`/`h` give the extent. This is the
/// on-disk representation used by label files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, frame: Size) -> Point {
    Point {
        x: pixel_x / frame.width,
        y: pixel_y / frame.height,
    }
}

/// Convert normalized coordinates to pixel coordinates.
pub fn denormalize_coordinates(point: &Point, frame: Size) -> (f64, f64) {
    (point.x * frame.width, point.y * frame.height)
}

/// Express a pixel rectangle relative to the frame.
///
/// Width is scaled by the frame width and height by the frame height.
pub fn normalize_rect(rect: &Rect, frame: Size) -> NormalizedRect {
    let center = rect.center();
    let c = normalize_coordinates(center.x, center.y, frame);
    let extent = normalize_coordinates(rect.width, rect.height, frame);
    NormalizedRect {
        cx: c.x,
        cy: c.y,
        w: extent.x,
        h: extent.y,
    }
}

/// Convert a normalized rectangle back to pixel coordinates.
pub fn denormalize_rect(normalized: &NormalizedRect, frame: Size) -> Rect {
    let (w, h) = denormalize_coordinates(&Point::new(normalized.w, normalized.h), frame);
    let (cx, cy) = denormalize_coordinates(&Point::new(normalized.cx, normalized.cy), frame);
    Rect::new(cx - w / 2.0, cy - h / 2.0, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rect_close(a: &Rect, b: &Rect) {
        assert!((a.x - b.x).abs() < 0.0001, "x: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < 0.0001, "y: {} vs {}", a.y, b.y);
        assert!((a.width - b.width).abs() < 0.0001, "w: {} vs {}", a.width, b.width);
        assert!((a.height - b.height).abs() < 0.0001, "h: {} vs {}", a.height, b.height);
    }

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        let frame = Size::new(1920.0, 1080.0);
        let pixel_x = 960.0;
        let pixel_y = 540.0;

        let normalized = normalize_coordinates(pixel_x, pixel_y, frame);
        let (denorm_x, denorm_y) = denormalize_coordinates(&normalized, frame);

        assert!((denorm_x - pixel_x).abs() < 0.0001);
        assert!((denorm_y - pixel_y).abs() < 0.0001);
    }

    #[test]
    fn test_normalize_corners() {
        let frame = Size::new(1920.0, 1080.0);

        let tl = normalize_coordinates(0.0, 0.0, frame);
        assert_eq!(tl.x, 0.0);
        assert_eq!(tl.y, 0.0);

        let br = normalize_coordinates(1920.0, 1080.0, frame);
        assert_eq!(br.x, 1.0);
        assert_eq!(br.y, 1.0);
    }

    #[test]
    fn test_rect_roundtrip_through_normalized() {
        let frame = Size::new(1000.0, 500.0);
        for rect in [
            Rect::new(400.0, 150.0, 200.0, 200.0),
            Rect::new(0.0, 0.0, 1000.0, 500.0),
            Rect::new(13.25, 477.5, 3.5, 22.5),
        ] {
            let back = denormalize_rect(&normalize_rect(&rect, frame), frame);
            assert_rect_close(&back, &rect);
        }
    }

    #[test]
    fn test_normalize_rect_uses_height_for_height() {
        let frame = Size::new(1000.0, 500.0);
        let n = normalize_rect(&Rect::new(400.0, 150.0, 200.0, 200.0), frame);
        assert!((n.cx - 0.5).abs() < 1e-9);
        assert!((n.cy - 0.5).abs() < 1e-9);
        assert!((n.w - 0.2).abs() < 1e-9);
        assert!((n.h - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_from_corners_any_order() {
        let a = Rect::from_corners(Point::new(10.0, 10.0), Point::new(2.0, 2.0));
        let b = Rect::from_corners(Point::new(2.0, 2.0), Point::new(10.0, 10.0));
        assert_eq!(a, b);
        assert_eq!(a, Rect::new(2.0, 2.0, 8.0, 8.0));
    }

    #[test]
    fn test_intersection_and_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_clamp_translation_keeps_rect_inside() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let rect = Rect::new(80.0, 10.0, 10.0, 10.0);
        let delta = rect.clamp_translation(Vector::new(50.0, -50.0), &bounds);
        assert_eq!(delta, Vector::new(10.0, -10.0));
    }
}
