//! PCA alignment of an embedded point cloud.
//!
//! The cloud is centered and its 3×3 covariance is built with ndarray.
//! The dominant eigenvector comes from 20 power iterations seeded at
//! (1, 0, 0). Two rotations are available:
//!
//! - [`PcaMode::Residual`]: x' is the projection onto the dominant axis;
//!   y' and z' are the centered y and z with that projection's share
//!   removed, each independently. Not a rotation, and not orthonormal.
//! - [`PcaMode::Full`]: the three principal axes are found by power
//!   iteration with Hotelling deflation and every point is re-expressed in
//!   that basis. Distances from the centroid are preserved.
//!
//! Clouds with fewer than 10 points are returned unchanged.

use ndarray::{arr1, Array1, Array2};

use crate::config::PcaMode;
use crate::point::Point3D;

/// Smallest cloud that gets aligned.
pub const MIN_PCA_POINTS: usize = 10;

/// Power iterations per eigenvector.
const POWER_ITERATIONS: usize = 20;

/// Vectors shorter than this are considered zero.
const MIN_NORM: f64 = 1e-12;

/// Centroid of a cloud (origin for an empty cloud).
pub fn centroid(points: &[Point3D]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let n = points.len() as f64;
    let mut c = [0.0; 3];
    for p in points {
        c[0] += p.x;
        c[1] += p.y;
        c[2] += p.z;
    }
    c.map(|v| v / n)
}

/// Population covariance of a cloud about its centroid.
pub fn covariance(points: &[Point3D]) -> Array2<f64> {
    let mut cov = Array2::<f64>::zeros((3, 3));
    if points.is_empty() {
        return cov;
    }

    let c = centroid(points);
    for p in points {
        let d = [p.x - c[0], p.y - c[1], p.z - c[2]];
        for i in 0..3 {
            for j in 0..3 {
                cov[[i, j]] += d[i] * d[j];
            }
        }
    }
    cov /= points.len() as f64;
    cov
}

/// Power iteration from `seed`, re-orthogonalized against `exclude` each step.
///
/// Returns the unit eigenvector estimate, or the last non-degenerate
/// iterate if the product collapses to zero.
fn power_iteration(matrix: &Array2<f64>, seed: Array1<f64>, exclude: &[Array1<f64>]) -> Array1<f64> {
    let mut v = seed;
    for _ in 0..POWER_ITERATIONS {
        let mut next = matrix.dot(&v);
        for e in exclude {
            let overlap = next.dot(e);
            next.scaled_add(-overlap, e);
        }
        let norm = next.dot(&next).sqrt();
        if norm < MIN_NORM {
            break;
        }
        v = next / norm;
    }
    v
}

/// Dominant eigenvector of a 3×3 covariance.
pub fn dominant_axis(cov: &Array2<f64>) -> [f64; 3] {
    let v = power_iteration(cov, arr1(&[1.0, 0.0, 0.0]), &[]);
    [v[0], v[1], v[2]]
}

/// The three principal axes, strongest first.
///
/// The second axis comes from power iteration on the Hotelling-deflated
/// covariance C - λ₁v₁v₁ᵀ; the third completes a right-handed basis.
pub fn principal_axes(cov: &Array2<f64>) -> [[f64; 3]; 3] {
    let v1 = power_iteration(cov, arr1(&[1.0, 0.0, 0.0]), &[]);
    let lambda1 = v1.dot(&cov.dot(&v1));

    let outer = Array2::from_shape_fn((3, 3), |(i, j)| v1[i] * v1[j]);
    let deflated = cov - &(outer * lambda1);

    // start from the basis vector least aligned with v1
    let weakest = (0..3)
        .min_by(|&a, &b| {
            v1[a]
                .abs()
                .partial_cmp(&v1[b].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(1);
    let mut seed = Array1::<f64>::zeros(3);
    seed[weakest] = 1.0;
    let overlap = seed.dot(&v1);
    seed.scaled_add(-overlap, &v1);
    let seed_norm = seed.dot(&seed).sqrt();
    let seed = seed / seed_norm;

    let v2 = power_iteration(&deflated, seed, &[v1.clone()]);
    let v3 = [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ];

    [[v1[0], v1[1], v1[2]], [v2[0], v2[1], v2[2]], v3]
}

/// Align a cloud on its principal axes (see module docs).
pub fn pca_align(points: &[Point3D], mode: PcaMode) -> Vec<Point3D> {
    if points.len() < MIN_PCA_POINTS {
        return points.to_vec();
    }

    let c = centroid(points);
    let cov = covariance(points);
    let centered = points
        .iter()
        .map(|p| ([p.x - c[0], p.y - c[1], p.z - c[2]], p.t));

    let dot = |a: &[f64; 3], b: &[f64; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];

    match mode {
        PcaMode::Residual => {
            let v = dominant_axis(&cov);
            centered
                .map(|(d, t)| {
                    let proj = dot(&d, &v);
                    Point3D::new(proj, d[1] - proj * v[1], d[2] - proj * v[2], t)
                })
                .collect()
        }
        PcaMode::Full => {
            let [a1, a2, a3] = principal_axes(&cov);
            centered
                .map(|(d, t)| Point3D::new(dot(&d, &a1), dot(&d, &a2), dot(&d, &a3), t))
                .collect()
        }
    }
}
