use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its top-left `(x1, y1)` and bottom-right
/// `(x2, y2)` corners.
///
/// Ordering of the corners is not enforced: slot layouts come from an external
/// store and may be inverted or degenerate. Methods document how they treat
/// such rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Signed area; negative when exactly one axis is inverted.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// True when the point lies strictly inside the open interval on both axes.
    pub fn contains_point_strict(&self, x: f32, y: f32) -> bool {
        x > self.x1 && x < self.x2 && y > self.y1 && y < self.y2
    }

    /// Overlap of two rectangles, `None` when the computed right edge lies left
    /// of the left edge or the bottom edge above the top edge.
    ///
    /// Touching edges produce a zero-area intersection rather than `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x1.max(other.x1);
        let top = self.y1.max(other.y1);
        let right = self.x2.min(other.x2);
        let bottom = self.y2.min(other.y2);

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right, bottom))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Clamp x into `[0, width]` and y into `[0, height]`.
    pub fn clamp_to(&self, width: f32, height: f32) -> Rect {
        Rect::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }
}

impl From<[f32; 4]> for Rect {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Rect::new(x1, y1, x2, y2)
    }
}
