//! Point types returned by every pipeline.

use serde::{Deserialize, Serialize};

/// A point of a 3D geometry.
///
/// `t` is a normalized sequence index in [0, 1] used downstream for
/// coloring and ordering; it never takes part in geometric computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    /// Euclidean distance from the origin.
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A vowel-space point with a per-point opacity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LpcPoint3D {
    pub point: Point3D,
    /// Min-max normalized dispersion over the current trajectory, in [0, 1].
    pub opacity: f64,
}

/// Normalized sequence position of item `i` out of `n`.
///
/// Single-item sequences map to 0.
#[inline]
pub(crate) fn sequence_t(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}
