//! Road boundary index
//!
//! Each track section ships a table of `(y, left, right)` samples describing
//! where the drivable road is. Sections are appended bottom to top while the
//! track is assembled; afterwards the index is read-only and answers "where
//! are the road edges at height y?" with a binary search.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Left/right road edges at one height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LateralBounds {
    pub left: f32,
    pub right: f32,
}

impl LateralBounds {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn midpoint(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Strictly between the edges
    pub fn contains(&self, x: f32) -> bool {
        x > self.left && x < self.right
    }
}

/// One stored sample
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundRow {
    y: f32,
    left: f32,
    right: f32,
}

/// Raw sample of a section, in the section's own units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionRow {
    pub y: f32,
    pub left: f32,
    pub right: f32,
}

impl SectionRow {
    pub fn new(y: f32, left: f32, right: f32) -> Self {
        Self { y, left, right }
    }
}

/// Sorted, append-only table of road edges
#[derive(Debug, Clone)]
pub struct RoadBoundIndex {
    rows: Vec<BoundRow>,
    /// Horizontal offset subtracted from every raw x
    center_x: f32,
    /// Longitudinal origin of the next section
    origin: f32,
    /// Shift applied to query coordinates by `recenter`
    shift: Vec2,
}

impl RoadBoundIndex {
    /// Empty index; the first section starts at `-center_y`
    pub fn new(center_x: f32, center_y: f32) -> Self {
        Self {
            rows: Vec::new(),
            center_x,
            origin: -center_y,
            shift: Vec2::ZERO,
        }
    }

    /// Append one section's samples (ascending y) scaled by `scale`
    pub fn append_section(&mut self, scale: Vec2, rows: &[SectionRow]) {
        let mut section_height = 0.0;
        for raw in rows {
            section_height = raw.y * scale.y;
            let row = BoundRow {
                y: self.origin + section_height,
                left: raw.left * scale.x - self.center_x,
                right: raw.right * scale.x - self.center_x,
            };
            debug_assert!(
                self.rows.last().is_none_or(|last| last.y <= row.y),
                "road rows must be appended in ascending order"
            );
            self.rows.push(row);
        }
        self.origin += section_height;
        log::info!("Road border size: {}", self.rows.len());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bounds of the first row at or beyond `y`, `None` past the last row
    pub fn bounds_at(&self, y: f32) -> Option<LateralBounds> {
        let y = y - self.shift.y;
        let idx = self.rows.partition_point(|row| row.y < y);
        self.rows.get(idx).map(|row| LateralBounds {
            left: row.left + self.shift.x,
            right: row.right + self.shift.x,
        })
    }

    /// Like [`Self::bounds_at`] but with the zero-width `(0, 0)` sentinel past the end
    pub fn bounds_or_sentinel(&self, y: f32) -> LateralBounds {
        self.bounds_at(y).unwrap_or_default()
    }

    /// Left edge point of row `index`
    pub fn left_by_index(&self, index: usize) -> Option<Vec2> {
        self.rows
            .get(index)
            .map(|row| Vec2::new(row.left, row.y) + self.shift)
    }

    /// Right edge point of row `index`
    pub fn right_by_index(&self, index: usize) -> Option<Vec2> {
        self.rows
            .get(index)
            .map(|row| Vec2::new(row.right, row.y) + self.shift)
    }

    /// Whether `(x, y)` lies strictly inside the road; unknown heights are off-road
    pub fn is_point_on_road(&self, x: f32, y: f32) -> bool {
        self.bounds_at(y).is_some_and(|b| b.contains(x))
    }

    /// Random point on the road at height `y` (never below the start line),
    /// keeping 10 units from either edge
    pub fn random_point_on_road<R: Rng>(&self, y: f32, rng: &mut R) -> Vec2 {
        let y = y.max(self.shift.y);
        let bounds = self.bounds_or_sentinel(y);
        let lo = (bounds.left + 10.0).ceil() as i32;
        let hi = (bounds.right - 10.0).floor() as i32;
        if lo > hi {
            return Vec2::new((bounds.left + bounds.right) / 2.0, y);
        }
        Vec2::new(rng.random_range(lo..=hi) as f32, y)
    }

    /// Shift the longitudinal/lateral origin of all queries
    pub fn recenter(&mut self, dx: f32, dy: f32) {
        self.shift += Vec2::new(dx, dy);
    }

    /// Area covered by the index
    pub fn bounding_rect(&self) -> Rect {
        let top = self.rows.last().map_or(0.0, |row| row.y) + self.shift.y;
        let bottom = self.shift.y.min(top);
        Rect::new(
            -self.center_x + self.shift.x,
            self.center_x + self.shift.x,
            top,
            bottom,
        )
    }
}
