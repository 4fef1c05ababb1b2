//! Post-processing of 3D trajectories: normalization, Laplacian smoothing
//! and stride downsampling.

use crate::pca::centroid;
use crate::point::Point3D;

/// Blend factor of one smoothing pass.
const SMOOTHING_BLEND: f64 = 0.5;

/// Largest distance from the origin (0 for an empty cloud).
pub fn max_radius(points: &[Point3D]) -> f64 {
    points.iter().map(Point3D::norm).fold(0.0, f64::max)
}

/// Center on the centroid and scale into the unit sphere.
///
/// When every point sits on the centroid the cloud is only centered.
pub fn normalize(points: &[Point3D]) -> Vec<Point3D> {
    let c = centroid(points);
    let mut out: Vec<Point3D> = points
        .iter()
        .map(|p| Point3D::new(p.x - c[0], p.y - c[1], p.z - c[2], p.t))
        .collect();

    let radius = max_radius(&out);
    if radius > 0.0 {
        for p in &mut out {
            p.x /= radius;
            p.y /= radius;
            p.z /= radius;
        }
    }
    out
}

/// Divide by the max radius without centering.
///
/// Used for the generator outputs, which are already origin-centered by
/// construction.
pub fn scale_to_unit_sphere(points: &mut [Point3D]) {
    let radius = max_radius(points);
    if radius > 0.0 {
        for p in points.iter_mut() {
            p.x /= radius;
            p.y /= radius;
            p.z /= radius;
        }
    }
}

/// Laplacian relaxation over the trajectory order.
///
/// Every pass moves each interior point halfway toward the midpoint of its
/// two neighbors, reading only the previous pass. Endpoints stay put.
pub fn smooth(points: &[Point3D], iterations: usize) -> Vec<Point3D> {
    let mut current = points.to_vec();
    if points.len() < 3 {
        return current;
    }

    let mut next = current.clone();
    for _ in 0..iterations {
        for i in 1..current.len() - 1 {
            let (prev, p, succ) = (current[i - 1], current[i], current[i + 1]);
            let blend = |a: f64, b: f64, c: f64| b + SMOOTHING_BLEND * ((a + c) / 2.0 - b);
            next[i] = Point3D::new(
                blend(prev.x, p.x, succ.x),
                blend(prev.y, p.y, succ.y),
                blend(prev.z, p.z, succ.z),
                p.t,
            );
        }
        std::mem::swap(&mut current, &mut next);
    }
    current
}

/// Keep every ceil(n / cap)-th point when n exceeds `cap`.
///
/// A cap of zero yields an empty result.
pub fn downsample<T: Copy>(points: &[T], cap: usize) -> Vec<T> {
    if cap == 0 {
        return Vec::new();
    }
    if points.len() <= cap {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(cap);
    points.iter().step_by(stride).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cloud() -> Vec<Point3D> {
        (0..50)
            .map(|i| {
                let f = i as f64;
                Point3D::new(f.sin() * 3.0 + 2.0, (f * 0.7).cos() - 1.0, f * 0.1, f / 49.0)
            })
            .collect()
    }

    #[test]
    fn test_normalize_bounds() {
        let out = normalize(&cloud());
        assert_relative_eq!(max_radius(&out), 1.0, epsilon = 1e-12);
        let c = centroid(&out);
        for v in c {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&cloud());
        let twice = normalize(&once);
        for (a, b) in once.iter().zip(&twice) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_degenerate_cloud_is_centered_only() {
        let pts = vec![Point3D::new(2.0, 2.0, 2.0, 0.5); 4];
        let out = normalize(&pts);
        for p in out {
            assert_eq!((p.x, p.y, p.z, p.t), (0.0, 0.0, 0.0, 0.5));
        }
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_scale_to_unit_sphere_keeps_center() {
        let mut pts = vec![Point3D::new(2.0, 0.0, 0.0, 0.0), Point3D::new(4.0, 0.0, 0.0, 1.0)];
        scale_to_unit_sphere(&mut pts);
        assert_relative_eq!(pts[0].x, 0.5);
        assert_relative_eq!(pts[1].x, 1.0);
    }

    #[test]
    fn test_smooth_single_pass() {
        let pts = vec![
            Point3D::new(0.0, 0.0, 0.0, 0.0),
            Point3D::new(4.0, 0.0, 0.0, 0.5),
            Point3D::new(0.0, 0.0, 0.0, 1.0),
        ];
        let out = smooth(&pts, 1);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[2], pts[2]);
        // 4 + 0.5 × (0 - 4)
        assert_relative_eq!(out[1].x, 2.0);
        assert_eq!(out[1].t, 0.5);
    }

    #[test]
    fn test_smooth_reads_previous_pass() {
        let pts: Vec<Point3D> = [0.0, 0.0, 8.0, 0.0, 0.0]
            .iter()
            .map(|&x| Point3D::new(x, 0.0, 0.0, 0.0))
            .collect();
        let out = smooth(&pts, 1);
        let xs: Vec<f64> = out.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_smooth_zero_iterations_and_short_input() {
        let pts = cloud();
        assert_eq!(smooth(&pts, 0), pts);
        assert_eq!(smooth(&pts[..2], 5), pts[..2].to_vec());
    }

    #[test]
    fn test_downsample_stride() {
        let pts = cloud();
        let out = downsample(&pts, 20);
        // stride ceil(50 / 20) = 3
        assert_eq!(out.len(), 17);
        assert_eq!(out[1], pts[3]);
        assert_eq!(downsample(&pts, 50).len(), 50);
        assert!(downsample(&pts, 0).is_empty());
        assert_eq!(downsample(&pts, 1).len(), 1);
    }
}
