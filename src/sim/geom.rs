//! Axis-aligned rectangles
//!
//! World coordinates have y growing upward (toward the finish line), so
//! `top >= bottom`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        debug_assert!(left <= right, "rect left {left} > right {right}");
        debug_assert!(bottom <= top, "rect bottom {bottom} > top {top}");
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Rectangle of `size` whose center is `center`
    pub fn centered_on(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(
            center.x - half.x,
            center.x + half.x,
            center.y + half.y,
            center.y - half.y,
        )
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Same rectangle moved by `delta`
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            left: self.left + delta.x,
            right: self.right + delta.x,
            top: self.top + delta.y,
            bottom: self.bottom + delta.y,
        }
    }

    /// Open-interval overlap test: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }

    /// Closed containment test for a point
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_measures() {
        let r = Rect::new(0.0, 10.0, 10.0, 0.0);
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 10.0);
        assert_eq!(r.center(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_centered_on() {
        let r = Rect::centered_on(Vec2::new(0.0, 100.0), Vec2::new(480.0, 800.0));
        assert_eq!(r, Rect::new(-240.0, 240.0, 500.0, -300.0));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 10.0, 10.0, 0.0);
        let b = Rect::new(10.0, 20.0, 10.0, 0.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(0.0, 10.0, 20.0, 10.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Rect::new(0.0, 10.0, 10.0, 0.0);
        let b = Rect::new(5.0, 15.0, 10.0, 5.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_degenerate_rect_allowed() {
        let r = Rect::new(3.0, 3.0, 7.0, 7.0);
        assert_eq!(r.width(), 0.0);
        assert!(r.contains(Vec2::new(3.0, 7.0)));
    }
}
