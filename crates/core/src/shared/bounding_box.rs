use serde::{Deserialize, Serialize};

/// Axis-aligned detector box in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Maps a box found on a horizontally mirrored frame back into the
    /// original frame's coordinates.
    pub fn unmirror(&self, frame_width: u32) -> BoundingBox {
        BoundingBox {
            x: frame_width as f64 - self.x - self.width,
            ..*self
        }
    }

    /// Euclidean center distance expressed in multiples of `self.width`.
    ///
    /// Scale-relative so the same threshold works for near and far faces.
    /// Degenerate (zero-width) boxes are infinitely far from everything.
    pub fn relative_center_distance(&self, other: &BoundingBox) -> f64 {
        if self.width <= 0.0 {
            return f64::INFINITY;
        }
        let dx = other.center_x() - self.center_x();
        let dy = other.center_y() - self.center_y();
        (dx * dx + dy * dy).sqrt() / self.width
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}
