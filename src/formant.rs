//! Formant - LPC-based formant frequency tracks.
//!
//! Documentation sources:
//! - Markel & Gray (1976): autocorrelation LPC, root-to-formant conversion
//! - Numerical Recipes Ch. 9.5 (Laguerre root finding, see [`crate::roots`])
//! - Traunmüller (1990): Bark scale (used by the vowel-space generator)
//!
//! Key facts:
//! - Analysis rate: 10 kHz (triangular-weighted decimation from higher rates)
//! - Pre-emphasis: x'[i] = x[i] - 0.97 × x[i-1]
//! - Hanning window, 50% hop
//! - LPC order: 14 (autocorrelation method, Levinson-Durbin recursion)
//! - Root filter: 0.5 < |z| < 0.99, Im(z) > 0
//! - Formant filter: 200-4000 Hz, bandwidth 20-500 Hz
//! - Missing formants default to 500/80, 1500/100, 2500/120 Hz

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::config::RootDeflation;
use crate::roots::find_roots;
use crate::signal::Signal;
use crate::spectral::{frame_starts, window_samples, FORMANT_MAX_HZ, FORMANT_MIN_HZ};
use crate::spectrum::hanning_window;

/// Sample rate the LPC analysis runs at.
pub const LPC_SAMPLE_RATE: f64 = 10_000.0;

/// Order of the prediction polynomial.
pub const LPC_ORDER: usize = 14;

/// First-difference pre-emphasis coefficient.
pub const PRE_EMPHASIS: f64 = 0.97;

/// Below this R[0] a frame counts as silent.
const SILENCE_ENERGY: f64 = 1e-10;

/// Accepted root magnitudes (exclusive bounds).
const MIN_ROOT_RADIUS: f64 = 0.5;
const MAX_ROOT_RADIUS: f64 = 0.99;

/// Accepted bandwidths in Hz (inclusive bounds).
const MIN_BANDWIDTH_HZ: f64 = 20.0;
const MAX_BANDWIDTH_HZ: f64 = 500.0;

/// Fallback (frequency, bandwidth) per formant slot.
pub const DEFAULT_LPC_FORMANTS: [FormantPoint; 3] = [
    FormantPoint::new(500.0, 80.0),
    FormantPoint::new(1500.0, 100.0),
    FormantPoint::new(2500.0, 120.0),
];

/// A single resonance: frequency and bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormantPoint {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Bandwidth in Hz.
    pub bandwidth: f64,
}

impl FormantPoint {
    pub const fn new(frequency: f64, bandwidth: f64) -> Self {
        Self {
            frequency,
            bandwidth,
        }
    }
}

/// LPC analysis result for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LpcFormantFrame {
    /// Frame center in seconds.
    pub time: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    /// (F3 - F1) / 2
    pub dispersion: f64,
    /// At least one slot holds a default value.
    pub degenerate: bool,
}

impl LpcFormantFrame {
    /// Build a frame from three formants sorted by frequency.
    pub fn new(time: f64, formants: [FormantPoint; 3], degenerate: bool) -> Self {
        let [p1, p2, p3] = formants;
        Self {
            time,
            f1: p1.frequency,
            f2: p2.frequency,
            f3: p3.frequency,
            b1: p1.bandwidth,
            b2: p2.bandwidth,
            b3: p3.bandwidth,
            dispersion: (p3.frequency - p1.frequency) / 2.0,
            degenerate,
        }
    }

    #[inline]
    pub fn formants(&self) -> [f64; 3] {
        [self.f1, self.f2, self.f3]
    }

    #[inline]
    pub fn bandwidths(&self) -> [f64; 3] {
        [self.b1, self.b2, self.b3]
    }
}

/// Downsample to exactly 10 kHz by triangular-weighted local averaging.
///
/// Output sample j is centered at c = j × ratio (ratio = fs / 10000) and
/// averages the inputs k in [floor(c) - ceil(ratio), ceil(c) + ceil(ratio)]
/// with weight 1 - |k - c| / ratio, skipping non-positive weights.
/// Signals at or below 10 kHz are returned unchanged at their own rate.
///
/// # Returns
///
/// (samples, effective sample rate)
pub fn downsample_to_10k(samples: &[f64], sample_rate: f64) -> (Vec<f64>, f64) {
    if sample_rate <= LPC_SAMPLE_RATE {
        return (samples.to_vec(), sample_rate);
    }

    let ratio = sample_rate / LPC_SAMPLE_RATE;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let half = ratio.ceil() as isize;
    let n = samples.len() as isize;

    let out = (0..out_len)
        .map(|j| {
            let center = j as f64 * ratio;
            let lo = center.floor() as isize - half;
            let hi = center.ceil() as isize + half;

            let mut sum = 0.0;
            let mut weight_sum = 0.0;
            for k in lo.max(0)..=hi.min(n - 1) {
                let wt = 1.0 - (k as f64 - center).abs() / ratio;
                if wt <= 0.0 {
                    continue;
                }
                sum += samples[k as usize] * wt;
                weight_sum += wt;
            }

            if weight_sum > 0.0 {
                sum / weight_sum
            } else {
                0.0
            }
        })
        .collect();

    (out, LPC_SAMPLE_RATE)
}

/// Apply first-difference pre-emphasis.
///
/// y[0] = x[0], y[n] = x[n] - α × x[n-1]
pub fn pre_emphasis(samples: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    if let Some(&first) = samples.first() {
        out.push(first);
        out.extend(samples.windows(2).map(|w| w[1] - alpha * w[0]));
    }
    out
}

/// Autocorrelation R[0..=order] of a windowed frame.
///
/// R[k] = Σ x[i] × x[i+k]
pub fn autocorrelation(frame: &[f64], order: usize) -> Vec<f64> {
    (0..=order)
        .map(|k| {
            if k >= frame.len() {
                0.0
            } else {
                frame[..frame.len() - k]
                    .iter()
                    .zip(&frame[k..])
                    .map(|(a, b)| a * b)
                    .sum()
            }
        })
        .collect()
}

/// Solve for LPC coefficients with the Levinson-Durbin recursion.
///
/// # Arguments
///
/// * `r` - Autocorrelation R[0..=order]
/// * `order` - Prediction order
///
/// # Returns
///
/// Coefficients a[0..=order] with a[0] = 1.0. For a silent frame
/// (R[0] < 1e-10) the remaining coefficients are all zero. The recursion
/// stops early when the prediction error stops being positive.
pub fn levinson_durbin(r: &[f64], order: usize) -> Vec<f64> {
    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;

    let order = order.min(r.len().saturating_sub(1));
    if r.is_empty() || r[0] < SILENCE_ENERGY {
        return a;
    }

    let mut err = r[0];
    let mut prev = a.clone();
    for i in 1..=order {
        let acc = r[i] + (1..i).map(|j| a[j] * r[i - j]).sum::<f64>();
        let k = -acc / err;

        prev.copy_from_slice(&a);
        for j in 1..i {
            a[j] = prev[j] + k * prev[i - j];
        }
        a[i] = k;

        err *= 1.0 - k * k;
        if err <= 0.0 {
            break;
        }
    }

    a
}

/// Convert polynomial roots to formant candidates.
///
/// For a root z = r × exp(iθ):
/// - Frequency = |θ| × sample_rate / (2π)
/// - Bandwidth = -ln(r) × sample_rate / π
///
/// Only roots with 0.5 < r < 0.99 and Im(z) > 0 whose frequency lies in
/// 200-4000 Hz and bandwidth in 20-500 Hz are kept. The result is sorted
/// by ascending frequency.
pub fn roots_to_formants(roots: &[Complex64], sample_rate: f64) -> Vec<FormantPoint> {
    let mut formants: Vec<FormantPoint> = roots
        .iter()
        .filter(|root| root.im > 0.0)
        .filter_map(|root| {
            let r = root.norm();
            if r <= MIN_ROOT_RADIUS || r >= MAX_ROOT_RADIUS {
                return None;
            }

            let frequency = root.arg().abs() * sample_rate / (2.0 * PI);
            let bandwidth = -r.ln() * sample_rate / PI;

            let in_band = (FORMANT_MIN_HZ..=FORMANT_MAX_HZ).contains(&frequency);
            let sharp = (MIN_BANDWIDTH_HZ..=MAX_BANDWIDTH_HZ).contains(&bandwidth);
            (in_band && sharp).then_some(FormantPoint::new(frequency, bandwidth))
        })
        .collect();

    formants.sort_by(|a, b| {
        a.frequency
            .partial_cmp(&b.frequency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    formants
}

/// Keep the three lowest candidates, filling missing slots with defaults.
///
/// Returns the triple sorted by frequency and whether any slot defaulted.
pub fn select_formants(candidates: &[FormantPoint]) -> ([FormantPoint; 3], bool) {
    let mut formants = DEFAULT_LPC_FORMANTS;
    let found = candidates.len().min(3);
    formants[..found].copy_from_slice(&candidates[..found]);
    formants.sort_by(|a, b| {
        a.frequency
            .partial_cmp(&b.frequency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    (formants, found < 3)
}

/// Compute the LPC formant trajectory of a signal.
///
/// Algorithm steps:
/// 1. Downsample to 10 kHz (triangular weights)
/// 2. Pre-emphasize with α = 0.97
/// 3. For each Hanning-tapered frame of `window_ms` (50% hop):
///    a. Autocorrelation up to order 14
///    b. LPC coefficients via Levinson-Durbin
///    c. Polynomial roots via Laguerre's method
///    d. Convert roots to frequencies and bandwidths, filter
///    e. Keep the three lowest, default the rest
///
/// Signals shorter than one window produce an empty trajectory.
///
/// # Arguments
///
/// * `signal` - Input signal
/// * `window_ms` - Window length in milliseconds
/// * `deflation` - Deflation policy for the root finder
pub fn signal_to_lpc_formants(
    signal: &Signal,
    window_ms: f64,
    deflation: RootDeflation,
) -> Vec<LpcFormantFrame> {
    let (samples, sample_rate) = downsample_to_10k(&signal.to_f64(), signal.sample_rate() as f64);
    let emphasized = pre_emphasis(&samples, PRE_EMPHASIS);

    let window_len = window_samples(sample_rate, window_ms);
    let starts = frame_starts(emphasized.len(), window_len);
    if starts.is_empty() {
        tracing::debug!(
            n_samples = emphasized.len(),
            window_len,
            "signal shorter than one LPC window"
        );
        return Vec::new();
    }

    let window = hanning_window(window_len);
    let mut frame = vec![0.0; window_len];

    let track: Vec<LpcFormantFrame> = starts
        .iter()
        .map(|&start| {
            for ((dst, &s), &w) in frame
                .iter_mut()
                .zip(&emphasized[start..start + window_len])
                .zip(&window)
            {
                *dst = s * w;
            }

            let r = autocorrelation(&frame, LPC_ORDER);
            let a = levinson_durbin(&r, LPC_ORDER);
            let roots = find_roots(&a, deflation);
            let candidates = roots_to_formants(&roots, sample_rate);
            let (formants, degenerate) = select_formants(&candidates);

            let time = (start as f64 + window_len as f64 / 2.0) / sample_rate;
            tracing::trace!(
                time,
                candidates = candidates.len(),
                f1 = formants[0].frequency,
                f2 = formants[1].frequency,
                f3 = formants[2].frequency,
                "lpc frame"
            );
            LpcFormantFrame::new(time, formants, degenerate)
        })
        .collect();

    tracing::debug!(
        frames = track.len(),
        sample_rate,
        window_len,
        ?deflation,
        "lpc formant track"
    );
    track
}
