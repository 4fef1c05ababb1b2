//! Validation of extracted formants against known targets.
//!
//! A trajectory is summarized by the per-formant median over its frames
//! (robust to the occasional frame where a formant is missed or a
//! spurious resonance slips in). Each median is compared with its target
//! by relative error.

use serde::{Deserialize, Serialize};

use crate::formant::LpcFormantFrame;
use crate::spectral::{FormantFrame, DEFAULT_FORMANTS};

/// Outcome of comparing measured formants with their targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Target F1, F2, F3 in Hz.
    pub expected: [f64; 3],
    /// Median F1, F2, F3 over the trajectory.
    pub measured: [f64; 3],
    /// |measured - expected| / expected per formant.
    pub relative_error: [f64; 3],
    pub tolerance: f64,
    pub n_frames: usize,
}

impl ValidationReport {
    /// Compare `measured` against `expected` at `tolerance`.
    pub fn new(expected: [f64; 3], measured: [f64; 3], tolerance: f64, n_frames: usize) -> Self {
        let mut relative_error = [0.0; 3];
        for ((err, &m), &e) in relative_error.iter_mut().zip(&measured).zip(&expected) {
            *err = if e != 0.0 {
                (m - e).abs() / e.abs()
            } else {
                (m - e).abs()
            };
        }
        Self {
            expected,
            measured,
            relative_error,
            tolerance,
            n_frames,
        }
    }

    /// Whether formant n (1-based) is within tolerance.
    pub fn formant_passed(&self, n: usize) -> bool {
        n >= 1 && n <= 3 && self.relative_error[n - 1] <= self.tolerance
    }

    /// All three formants within tolerance, over a non-empty trajectory.
    pub fn passed(&self) -> bool {
        self.n_frames > 0 && (1..=3).all(|n| self.formant_passed(n))
    }

    /// Largest relative error of the three.
    pub fn worst_error(&self) -> f64 {
        self.relative_error.iter().cloned().fold(0.0, f64::max)
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values[values.len() / 2]
}

/// Per-formant median over a set of (F1, F2, F3) triples.
///
/// Uses the upper median for even counts. Empty input gives the default
/// formants.
pub fn median_formants<I>(triples: I) -> [f64; 3]
where
    I: IntoIterator<Item = [f64; 3]>,
{
    let mut columns: [Vec<f64>; 3] = Default::default();
    for triple in triples {
        for (col, f) in columns.iter_mut().zip(triple) {
            col.push(f);
        }
    }
    if columns[0].is_empty() {
        return DEFAULT_FORMANTS;
    }
    columns.map(|mut col| median(&mut col))
}

/// Validate a spectral formant trajectory.
pub fn validate_formants(
    track: &[FormantFrame],
    expected: [f64; 3],
    tolerance: f64,
) -> ValidationReport {
    let measured = median_formants(track.iter().map(FormantFrame::formants));
    ValidationReport::new(expected, measured, tolerance, track.len())
}

/// Validate an LPC formant trajectory.
pub fn validate_lpc_formants(
    track: &[LpcFormantFrame],
    expected: [f64; 3],
    tolerance: f64,
) -> ValidationReport {
    let measured = median_formants(track.iter().map(LpcFormantFrame::formants));
    ValidationReport::new(expected, measured, tolerance, track.len())
}
