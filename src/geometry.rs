//! Geometry generators driven by formant trajectories.
//!
//! # Lissajous
//!
//! The mean F1, F2, F3 of the trajectory give three frequency ratios
//!
//! ```text
//! r12 = F1/F2   r23 = F2/F3   r13 = F1/F3
//! ```
//!
//! and a fixed-phase curve is traced over 10 cycles with 2000 samples:
//!
//! ```text
//! x = sin(r12 θ)   y = sin(r23 θ + π/4)   z = sin(r13 θ + π/2)
//! ```
//!
//! # Lissajous Manifold
//!
//! Every frame with a stable formant pattern contributes a short 20-point
//! segment over 1.5 cycles built from that frame's own ratios. Stability is
//! w = min(0.05 / (Δ + 0.001), 1), where Δ is the summed absolute change of
//! F1..F3 from the previous frame; frames with w < 0.1 are dropped. Segment
//! coordinates are scaled by w. Frame i jitters the phases with
//! a = i·φ mod 2π (golden ratio) and b = i·√2 mod 2π so successive segments
//! do not lock onto one curve; z takes both jitters:
//!
//! ```text
//! x = w sin(r12 θ + a)   y = w sin(r23 θ + π/4 + b)   z = w sin(r13 θ + π/2 + a + b)
//! ```
//!
//! # Cymatics
//!
//! Mean formants select integer mode numbers n, m, k ∈ [1, 12] and a
//! Chladni-style height field is sampled on a square grid over [-2, 2]².
//! The grid side is ⌊√max_points⌋, capped at [`MAX_CYMATICS_SIDE`]:
//!
//! ```text
//! z = [sin(nπx)cos(mπy) + cos(nπx)sin(mπy)] × sin(kπ(x+y)/2)
//! ```
//!
//! # Vowel Space
//!
//! LPC frames are placed in a fixed Bark-scale vowel chart: F2 runs along
//! -x (front vowels on the left), F1 along -y (open vowels at the bottom),
//! and the summed bandwidth B1 + B2 sets z. The mapping uses hard limits
//! so positions are comparable across files. Opacity is the frame's
//! dispersion, min-max normalized over the trajectory.
//!
//! Every generator caps its output with a stride downsample and then
//! scales it into the unit sphere, except the vowel space, which keeps its
//! absolute coordinates.

use std::f64::consts::PI;

use crate::formant::LpcFormantFrame;
use crate::manifold::{downsample, scale_to_unit_sphere};
use crate::point::{sequence_t, LpcPoint3D, Point3D};
use crate::spectral::{mean_formants, FormantFrame};

/// Samples of the averaged Lissajous curve.
pub const LISSAJOUS_SAMPLES: usize = 2000;

/// Cycles traced by the averaged Lissajous curve.
pub const LISSAJOUS_CYCLES: f64 = 10.0;

/// Points per manifold segment.
pub const SEGMENT_POINTS: usize = 20;

/// Cycles per manifold segment.
pub const SEGMENT_CYCLES: f64 = 1.5;

/// Frames whose stability weight falls below this are skipped.
pub const MIN_STABILITY: f64 = 0.1;

const STABILITY_SCALE: f64 = 0.05;
const STABILITY_EPS: f64 = 1e-3;

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Hz per cymatics mode number for F1, F2, F3.
const CYMATICS_MODE_HZ: [f64; 3] = [150.0, 400.0, 600.0];
const MAX_MODE: f64 = 12.0;
const CYMATICS_EXTENT: f64 = 2.0;

/// Largest cymatics grid side (about one million points).
pub const MAX_CYMATICS_SIDE: usize = 1024;

/// Bark range mapped onto [-1, 1].
const BARK_MIN: f64 = 1.0;
const BARK_MAX: f64 = 18.0;

/// Half-height of the bandwidth axis.
const THICKNESS_LIMIT: f64 = 0.4;

/// Convert a frequency to the Bark scale.
///
/// Bark = 26.81 × f / (1960 + f) - 0.53
#[inline]
pub fn hz_to_bark(hz: f64) -> f64 {
    26.81 * hz / (1960.0 + hz) - 0.53
}

/// Map a Bark value from [1, 18] onto [-1, 1], clamping outside values.
#[inline]
pub fn bark_to_unit(bark: f64) -> f64 {
    ((bark - BARK_MIN) / (BARK_MAX - BARK_MIN) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// Averaged Lissajous curve of a spectral trajectory.
pub fn lissajous(track: &[FormantFrame], max_points: usize) -> Vec<Point3D> {
    if track.is_empty() {
        return Vec::new();
    }

    let [f1, f2, f3] = mean_formants(track);
    let (r12, r23, r13) = (f1 / f2, f2 / f3, f1 / f3);

    let curve: Vec<Point3D> = (0..LISSAJOUS_SAMPLES)
        .map(|i| {
            let theta = 2.0 * PI * LISSAJOUS_CYCLES * i as f64 / LISSAJOUS_SAMPLES as f64;
            Point3D::new(
                (r12 * theta).sin(),
                (r23 * theta + PI / 4.0).sin(),
                (r13 * theta + PI / 2.0).sin(),
                sequence_t(i, LISSAJOUS_SAMPLES),
            )
        })
        .collect();

    finish(curve, max_points)
}

/// Stability weight of every frame (the first frame has Δ = 0).
pub fn stability_weights(track: &[FormantFrame]) -> Vec<f64> {
    let mut previous: Option<[f64; 3]> = None;
    track
        .iter()
        .map(|frame| {
            let formants = frame.formants();
            let delta = previous.map_or(0.0, |prev| {
                prev.iter().zip(&formants).map(|(a, b)| (b - a).abs()).sum()
            });
            previous = Some(formants);
            (STABILITY_SCALE / (delta + STABILITY_EPS)).min(1.0)
        })
        .collect()
}

/// Time-stacked, stability-weighted Lissajous segments.
pub fn lissajous_manifold(track: &[FormantFrame], max_points: usize) -> Vec<Point3D> {
    let weights = stability_weights(track);
    let n_frames = track.len();

    let mut points = Vec::with_capacity(n_frames * SEGMENT_POINTS);
    let mut skipped = 0usize;
    for (i, (frame, &w)) in track.iter().zip(&weights).enumerate() {
        if w < MIN_STABILITY {
            skipped += 1;
            continue;
        }

        let (r12, r23, r13) = (frame.f1 / frame.f2, frame.f2 / frame.f3, frame.f1 / frame.f3);
        let phase_a = (i as f64 * GOLDEN_RATIO) % (2.0 * PI);
        let phase_b = (i as f64 * std::f64::consts::SQRT_2) % (2.0 * PI);
        let t = sequence_t(i, n_frames);

        points.extend((0..SEGMENT_POINTS).map(|j| {
            let theta = 2.0 * PI * SEGMENT_CYCLES * j as f64 / (SEGMENT_POINTS - 1) as f64;
            Point3D::new(
                w * (r12 * theta + phase_a).sin(),
                w * (r23 * theta + PI / 4.0 + phase_b).sin(),
                w * (r13 * theta + PI / 2.0 + phase_a + phase_b).sin(),
                t,
            )
        }));
    }

    tracing::debug!(frames = n_frames, skipped, "lissajous manifold");
    finish(points, max_points)
}

/// Cymatics mode numbers (n, m, k) for a formant triple.
pub fn cymatics_modes(formants: [f64; 3]) -> [f64; 3] {
    let mut modes = [0.0; 3];
    for ((mode, f), hz) in modes.iter_mut().zip(formants).zip(CYMATICS_MODE_HZ) {
        *mode = (f / hz).round().clamp(1.0, MAX_MODE);
    }
    modes
}

/// Standing-wave surface sampled on a floor(√max_points)² grid.
pub fn cymatics(track: &[FormantFrame], max_points: usize) -> Vec<Point3D> {
    if track.is_empty() || max_points == 0 {
        return Vec::new();
    }

    let grid = cymatics_side(max_points);
    if grid < 2 {
        return vec![Point3D::default()];
    }

    let [n, m, k] = cymatics_modes(mean_formants(track));
    let coord = |i: usize| -CYMATICS_EXTENT + 2.0 * CYMATICS_EXTENT * i as f64 / (grid - 1) as f64;
    let total = grid * grid;

    let surface: Vec<Point3D> = (0..total)
        .map(|idx| {
            let (x, y) = (coord(idx % grid), coord(idx / grid));
            let z = ((n * PI * x).sin() * (m * PI * y).cos()
                + (n * PI * x).cos() * (m * PI * y).sin())
                * (k * PI * (x + y) / 2.0).sin();
            Point3D::new(x, y, z, sequence_t(idx, total))
        })
        .collect();

    finish(surface, max_points)
}

/// Grid side for a point budget; side² never exceeds `max_points`.
pub fn cymatics_side(max_points: usize) -> usize {
    let mut side = ((max_points as f64).sqrt().floor() as usize).min(MAX_CYMATICS_SIDE);
    // f64 rounding can overshoot the exact root by one
    while side > 0 && side * side > max_points {
        side -= 1;
    }
    side
}

/// Project LPC frames into the Bark vowel space.
pub fn vowel_space(track: &[LpcFormantFrame], max_points: usize) -> Vec<LpcPoint3D> {
    let (lo, hi) = track
        .iter()
        .map(|f| f.dispersion)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
    let range = hi - lo;

    let points: Vec<LpcPoint3D> = track
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let x = -bark_to_unit(hz_to_bark(frame.f2));
            let y = -bark_to_unit(hz_to_bark(frame.f1));
            let z = ((frame.b1 + frame.b2) / 1000.0 * 0.8 - THICKNESS_LIMIT)
                .clamp(-THICKNESS_LIMIT, THICKNESS_LIMIT);
            let opacity = if range > 0.0 {
                (frame.dispersion - lo) / range
            } else {
                1.0
            };
            LpcPoint3D {
                point: Point3D::new(x, y, z, sequence_t(i, track.len())),
                opacity,
            }
        })
        .collect();

    downsample(&points, max_points)
}

fn finish(points: Vec<Point3D>, max_points: usize) -> Vec<Point3D> {
    let mut points = downsample(&points, max_points);
    scale_to_unit_sphere(&mut points);
    points
}
