//! Embedding - Takens delay embedding and its preprocessing.
//!
//! A scalar waveform s is unfolded into a 3D trajectory
//!
//! ```text
//! p(t) = (s[t], s[t+τ], s[t+2τ])     t in 0..n-2τ
//! ```
//!
//! whose shape reflects the dynamics of the source: a pure tone traces an
//! ellipse, a voiced vowel a braided loop, noise a diffuse cloud.
//!
//! The delay τ is either fixed or estimated from the first zero crossing
//! (or first local minimum) of the autocorrelation. An optional
//! preprocessing stage band-passes the signal to 60-4000 Hz with two
//! single-pole IIR sections and decimates it to about 1 kHz.

use std::f64::consts::PI;

use crate::point::{sequence_t, Point3D};

/// High-pass corner of the preprocessing band in Hz.
pub const HIGHPASS_HZ: f64 = 60.0;

/// Low-pass corner of the preprocessing band in Hz.
pub const LOWPASS_HZ: f64 = 4000.0;

/// Sample rate targeted by the adaptive downsampler.
pub const EMBEDDING_RATE: f64 = 1000.0;

/// τ returned for near-silent signals.
pub const SILENT_TAU: usize = 10;

/// τ returned when the autocorrelation has no crossing and no minimum.
pub const FALLBACK_TAU: usize = 15;

/// Lower bound applied to a detected τ.
pub const MIN_DETECTED_TAU: usize = 5;

/// Largest lag searched by [`auto_tau`].
pub const MAX_TAU_LAG: usize = 500;

const SILENCE_VARIANCE: f64 = 1e-10;

/// Delay-embed `samples` into 3D with delay `tau`.
///
/// Returns n - 2τ points, or none when n < 2τ + 1. τ = 0 is treated as 1.
/// Each point's `t` is its position in the trajectory, in [0, 1].
pub fn takens_embedding(samples: &[f64], tau: usize) -> Vec<Point3D> {
    let tau = tau.max(1);
    let n = samples.len();
    if n < 2 * tau + 1 {
        return Vec::new();
    }

    let n_points = n - 2 * tau;
    (0..n_points)
        .map(|i| {
            Point3D::new(
                samples[i],
                samples[i + tau],
                samples[i + 2 * tau],
                sequence_t(i, n_points),
            )
        })
        .collect()
}

/// Single-pole RC high-pass filter.
///
/// y[0] = x[0], y[i] = α × (y[i-1] + x[i] - x[i-1]), α = RC / (RC + dt)
pub fn highpass(samples: &[f64], sample_rate: f64, cutoff_hz: f64) -> Vec<f64> {
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let dt = 1.0 / sample_rate;
    let alpha = rc / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    if let Some(&first) = samples.first() {
        out.push(first);
        for i in 1..samples.len() {
            let prev = out[i - 1];
            out.push(alpha * (prev + samples[i] - samples[i - 1]));
        }
    }
    out
}

/// Single-pole exponential low-pass filter.
///
/// y[i] = (1 - a) × x[i] + a × y[i-1], a = exp(-2π × fc / fs), y[-1] = 0
pub fn lowpass(samples: &[f64], sample_rate: f64, cutoff_hz: f64) -> Vec<f64> {
    let a = (-2.0 * PI * cutoff_hz / sample_rate).exp();
    let mut prev = 0.0;
    samples
        .iter()
        .map(|&x| {
            prev = (1.0 - a) * x + a * prev;
            prev
        })
        .collect()
}

/// 60 Hz high-pass followed by a 4 kHz low-pass.
pub fn bandpass(samples: &[f64], sample_rate: f64) -> Vec<f64> {
    lowpass(
        &highpass(samples, sample_rate, HIGHPASS_HZ),
        sample_rate,
        LOWPASS_HZ,
    )
}

/// Keep every k-th sample, k = max(1, floor(fs / target_rate)).
///
/// # Returns
///
/// (decimated samples, effective sample rate fs / k)
pub fn adaptive_downsample(samples: &[f64], sample_rate: f64, target_rate: f64) -> (Vec<f64>, f64) {
    let stride = ((sample_rate / target_rate).floor() as usize).max(1);
    let out = samples.iter().step_by(stride).copied().collect();
    (out, sample_rate / stride as f64)
}

/// Band-pass then decimate to about 1 kHz.
pub fn preprocess(samples: &[f64], sample_rate: f64) -> (Vec<f64>, f64) {
    adaptive_downsample(&bandpass(samples, sample_rate), sample_rate, EMBEDDING_RATE)
}

/// Estimate the embedding delay from the autocorrelation.
///
/// Uses the biased, mean-removed autocorrelation up to lag
/// min(500, n / 4):
/// 1. Near-silent input (R[0] < 1e-10) gives 10
/// 2. First lag with R ≤ 0, at least 5
/// 3. Otherwise first local minimum, at least 5
/// 4. Otherwise 15
pub fn auto_tau(samples: &[f64]) -> usize {
    let n = samples.len();
    if n == 0 {
        return SILENT_TAU;
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = samples.iter().map(|&s| s - mean).collect();
    let acf = |lag: usize| -> f64 {
        centered[..n - lag]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64
    };

    if acf(0) < SILENCE_VARIANCE {
        return SILENT_TAU;
    }

    let max_lag = MAX_TAU_LAG.min(n / 4);
    if max_lag < 1 {
        return FALLBACK_TAU;
    }
    let r: Vec<f64> = (0..=max_lag).map(acf).collect();

    if let Some(lag) = (1..=max_lag).find(|&lag| r[lag] <= 0.0) {
        return lag.max(MIN_DETECTED_TAU);
    }

    if let Some(lag) = (1..max_lag).find(|&lag| r[lag] < r[lag - 1] && r[lag] < r[lag + 1]) {
        return lag.max(MIN_DETECTED_TAU);
    }

    FALLBACK_TAU
}
