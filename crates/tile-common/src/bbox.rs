//! Bounding box types and operations.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// A rectangular extent in the coordinate units of the tile grid.
///
/// Values are stored as given; use [`BoundingBox::normalized`] when the caller
/// may have swapped corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build from a `(left, bottom, right, top)` sequence.
    ///
    /// Anything other than exactly four values is rejected.
    pub fn from_slice(values: &[f64]) -> Result<Self, ParseError> {
        match values {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            other => Err(ParseError::InvalidBoundsCount(other.len())),
        }
    }

    /// Same extent with min/max ordered on both axes.
    pub fn normalized(&self) -> Self {
        Self {
            min_x: self.min_x.min(self.max_x),
            min_y: self.min_y.min(self.max_y),
            max_x: self.min_x.max(self.max_x),
            max_y: self.min_y.max(self.max_y),
        }
    }

    /// Corner coordinates in the order upper-left, upper-right, lower-right, lower-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let b = self.normalized();
        [
            (b.min_x, b.max_y),
            (b.max_x, b.max_y),
            (b.max_x, b.min_y),
            (b.min_x, b.min_y),
        ]
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).abs()
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).abs()
    }

    /// Check if this bbox overlaps another with positive area.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.min_x < b.max_x && a.max_x > b.min_x && a.min_y < b.max_y && a.max_y > b.min_y
    }

    /// True if `other` lies entirely inside this bbox, edges included.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.min_x <= b.min_x && a.min_y <= b.min_y && a.max_x >= b.max_x && a.max_y >= b.max_y
    }

    /// Overlapping extent of two boxes, `None` if they share no area.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        let a = self.normalized();
        let b = other.normalized();
        Some(Self::new(
            a.min_x.max(b.min_x),
            a.min_y.max(b.min_y),
            a.max_x.min(b.max_x),
            a.max_y.min(b.max_y),
        ))
    }

    /// All four coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Values as `[minx, miny, maxx, maxy]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}
