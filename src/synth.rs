//! Test-signal synthesis.
//!
//! Vowels are built additively: every harmonic of f0 below 5 kHz (and
//! below Nyquist) gets the magnitude response of a cascade of three
//! second-order resonators at that frequency, times a -6 dB/octave source
//! tilt (1/h). For resonance F with bandwidth B the magnitude at f is
//!
//! ```text
//! |H(f)| = F² / sqrt((F² - f²)² + (f × B)²)
//! ```
//!
//! which is 1 at DC and F / B at resonance. The sum is peak-normalized to 1.

use std::f64::consts::PI;

use crate::error::Result;
use crate::signal::Signal;

/// Harmonics above this are left out.
pub const MAX_HARMONIC_HZ: f64 = 5000.0;

/// Bandwidths used when none are given.
pub const DEFAULT_BANDWIDTHS: [f64; 3] = [60.0, 90.0, 120.0];

/// Magnitude of a single resonator at `freq`.
#[inline]
pub fn resonator_gain(freq: f64, formant: f64, bandwidth: f64) -> f64 {
    let f2 = formant * formant;
    f2 / ((f2 - freq * freq).powi(2) + (freq * bandwidth).powi(2)).sqrt()
}

/// (frequency, amplitude) of every harmonic of a vowel.
pub fn vowel_harmonics(
    f0: f64,
    formants: [f64; 3],
    bandwidths: [f64; 3],
    sample_rate: u32,
) -> Vec<(f64, f64)> {
    if f0 <= 0.0 {
        return Vec::new();
    }
    let limit = MAX_HARMONIC_HZ.min(sample_rate as f64 / 2.0);

    (1..)
        .map(|h| (h, h as f64 * f0))
        .take_while(|&(_, f)| f < limit)
        .map(|(h, f)| {
            let gain: f64 = formants
                .iter()
                .zip(&bandwidths)
                .map(|(&formant, &bw)| resonator_gain(f, formant, bw))
                .product();
            (f, gain / h as f64)
        })
        .collect()
}

/// Synthesize a steady vowel.
///
/// # Arguments
///
/// * `f0` - Fundamental frequency in Hz
/// * `formants` - F1, F2, F3 in Hz
/// * `bandwidths` - B1, B2, B3 in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `seconds` - Duration
///
/// # Errors
///
/// `Error::InvalidParameter` for a zero sample rate.
pub fn vowel(
    f0: f64,
    formants: [f64; 3],
    bandwidths: [f64; 3],
    sample_rate: u32,
    seconds: f64,
) -> Result<Signal> {
    let harmonics = vowel_harmonics(f0, formants, bandwidths, sample_rate);
    let n = (sample_rate as f64 * seconds).round().max(0.0) as usize;
    let fs = sample_rate.max(1) as f64;

    let raw: Vec<f64> = (0..n)
        .map(|i| {
            harmonics
                .iter()
                .map(|&(f, a)| a * (2.0 * PI * f * i as f64 / fs).sin())
                .sum()
        })
        .collect();

    Signal::from_slice(&peak_normalize(&raw), sample_rate)
}

/// Synthesize a unit-amplitude sine.
pub fn sine(freq: f64, sample_rate: u32, seconds: f64) -> Result<Signal> {
    let n = (sample_rate as f64 * seconds).round().max(0.0) as usize;
    let fs = sample_rate.max(1) as f64;
    let samples: Vec<f32> = (0..n)
        .map(|i| (2.0 * PI * freq * i as f64 / fs).sin() as f32)
        .collect();
    Signal::from_slice(&samples, sample_rate)
}

/// An all-zero signal.
pub fn silence(sample_rate: u32, seconds: f64) -> Result<Signal> {
    let n = (sample_rate as f64 * seconds).round().max(0.0) as usize;
    Signal::from_slice(&vec![0.0; n], sample_rate)
}

fn peak_normalize(samples: &[f64]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };
    samples.iter().map(|&s| (s * scale) as f32).collect()
}
