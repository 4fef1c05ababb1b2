//! Spectrum - FFT magnitude spectra and spectral envelopes.
//!
//! This module holds the FFT kernel shared by the spectral formant engine:
//! a Hanning-tapered frame is zero-padded to the next power of two,
//! transformed, and only the magnitudes of the first half of the bins
//! (positive frequencies) are kept.
//!
//! # Spectral Envelope
//!
//! Voiced speech has a harmonic spectrum: energy sits on multiples of F0,
//! and the resonances (formants) only show as the shape traced by those
//! harmonics. The envelope bridges the comb between partials: every local
//! maximum of the log-magnitude spectrum (plus both edge bins) becomes an
//! anchor, and the bins between two anchors are filled by a straight line
//! in the log domain:
//!
//! ```text
//! L[k] = ln(|X[k]| + 1e-10)
//! E[k] = exp( L[a] + (L[b] - L[a]) × (k - a) / (b - a) ),  a ≤ k ≤ b
//! ```
//!
//! where a and b are consecutive anchors. The envelope has a maximum only
//! where a partial is louder than both neighboring partials, so resonances
//! a few harmonics apart stay separate.

use std::sync::Arc;

use ndarray::Array1;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Floor added to magnitudes before taking the logarithm.
const LOG_FLOOR: f64 = 1e-10;

/// Magnitude spectrum of one analysis frame (positive frequencies only).
#[derive(Debug, Clone)]
pub struct MagnitudeSpectrum {
    /// |X[k]| for k in 0..fft_size/2.
    magnitudes: Array1<f64>,

    /// Frequency resolution (bin width) in Hz.
    ///
    /// df = sample_rate / fft_size
    df: f64,
}

impl MagnitudeSpectrum {
    pub fn new(magnitudes: Array1<f64>, df: f64) -> Self {
        Self { magnitudes, df }
    }

    #[inline]
    pub fn magnitudes(&self) -> &Array1<f64> {
        &self.magnitudes
    }

    /// Frequency resolution (bin width) in Hz.
    #[inline]
    pub fn df(&self) -> f64 {
        self.df
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Frequency of a bin: bin_index × df.
    #[inline]
    pub fn get_frequency(&self, bin_index: usize) -> f64 {
        bin_index as f64 * self.df
    }

    /// Spectral envelope, same length as the spectrum.
    pub fn envelope(&self) -> Array1<f64> {
        Array1::from_vec(spectral_envelope(
            self.magnitudes.as_slice().unwrap_or(&[]),
        ))
    }
}

/// Reusable forward FFT of a fixed power-of-two size.
///
/// One kernel is planned per analysis call and reused for every frame;
/// its buffer lives only as long as that call.
pub struct FftKernel {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    size: usize,
}

impl FftKernel {
    /// Plan a kernel large enough for frames of `frame_len` samples.
    pub fn for_frame_len(frame_len: usize) -> Self {
        let size = next_power_of_two(frame_len);
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(size),
            buffer: vec![Complex::new(0.0, 0.0); size],
            size,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform one (already windowed) frame.
    ///
    /// The frame is zero-padded to the kernel size. Frames longer than the
    /// kernel are truncated.
    pub fn magnitude_spectrum(&mut self, frame: &[f64], sample_rate: f64) -> MagnitudeSpectrum {
        for (slot, &s) in self
            .buffer
            .iter_mut()
            .zip(frame.iter().chain(std::iter::repeat(&0.0)))
        {
            *slot = Complex::new(s, 0.0);
        }

        // X[k] = Σ x[n] × e^(-2πikn/N)
        self.fft.process(&mut self.buffer);

        let half = self.size / 2;
        let magnitudes: Array1<f64> = self.buffer[..half].iter().map(|c| c.norm()).collect();

        MagnitudeSpectrum::new(magnitudes, sample_rate / self.size as f64)
    }
}

/// Smallest power of two that is >= n (1 for n = 0).
pub fn next_power_of_two(n: usize) -> usize {
    let mut size = 1;
    while size < n {
        size *= 2;
    }
    size
}

/// Generate a symmetric Hanning window.
///
/// # Formula
///
/// ```text
/// w(n) = 0.5 - 0.5 × cos(2πn / (N-1))
/// ```
pub fn hanning_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }

    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Bridge the harmonic comb of a magnitude spectrum (see module docs).
pub fn spectral_envelope(magnitudes: &[f64]) -> Vec<f64> {
    let log_mag: Vec<f64> = magnitudes.iter().map(|&m| (m + LOG_FLOOR).ln()).collect();
    let n_bins = log_mag.len();
    if n_bins < 3 {
        return log_mag.iter().map(|v| v.exp()).collect();
    }

    // A plateau is anchored at its first bin
    let mut anchors = vec![0];
    anchors.extend(
        (1..n_bins - 1).filter(|&k| log_mag[k] > log_mag[k - 1] && log_mag[k] >= log_mag[k + 1]),
    );
    anchors.push(n_bins - 1);

    let mut envelope = vec![0.0; n_bins];
    for pair in anchors.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let slope = (log_mag[b] - log_mag[a]) / (b - a) as f64;
        for (offset, slot) in envelope[a..=b].iter_mut().enumerate() {
            *slot = (log_mag[a] + slope * offset as f64).exp();
        }
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(1102), 2048);
        assert_eq!(next_power_of_two(2048), 2048);
    }

    #[test]
    fn test_hanning_window_shape() {
        let w = hanning_window(101);
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[100], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[50], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[25], w[75], epsilon = 1e-12);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        // 1 kHz at 8 kHz, 256 samples: exactly bin 32
        let sr = 8000.0;
        let frame: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / sr).sin())
            .collect();
        let mut kernel = FftKernel::for_frame_len(frame.len());
        let spec = kernel.magnitude_spectrum(&frame, sr);

        assert_eq!(spec.n_bins(), 128);
        assert_relative_eq!(spec.df(), 31.25);
        let (peak_bin, _) = spec
            .magnitudes()
            .iter()
            .enumerate()
            .fold((0, 0.0), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc });
        assert_eq!(peak_bin, 32);
        assert_relative_eq!(spec.get_frequency(peak_bin), 1000.0);
        // |X| of a unit sine on an exact bin is N/2
        assert_relative_eq!(spec.magnitudes()[32], 128.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_padding() {
        let mut kernel = FftKernel::for_frame_len(100);
        assert_eq!(kernel.size(), 128);
        let spec = kernel.magnitude_spectrum(&[1.0; 100], 1000.0);
        assert_eq!(spec.n_bins(), 64);
        // DC bin holds the sum of the frame
        assert_relative_eq!(spec.magnitudes()[0], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_envelope_of_flat_spectrum_is_flat() {
        let env = spectral_envelope(&[2.0; 300]);
        assert_eq!(env.len(), 300);
        for v in env {
            assert_relative_eq!(v, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_envelope_suppresses_comb() {
        // harmonic comb: every 6th bin is loud
        let mags: Vec<f64> = (0..600).map(|k| if k % 6 == 0 { 100.0 } else { 1.0 }).collect();
        let env = spectral_envelope(&mags);
        for v in &env[..595] {
            assert_relative_eq!(*v, 100.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_envelope_keeps_close_resonances_apart() {
        // two comb humps 8 partials apart, loudest partials at bins 60 and 108
        let hump = |k: usize, centre: f64| 50.0 / (1.0 + ((k as f64 - centre) / 12.0).powi(2));
        let mags: Vec<f64> = (0..200)
            .map(|k| if k % 6 == 0 { 1.0 + hump(k, 60.0) + hump(k, 108.0) } else { 0.5 })
            .collect();
        let env = spectral_envelope(&mags);
        let maxima: Vec<usize> = (1..env.len() - 1)
            .filter(|&k| env[k] > env[k - 1] && env[k] > env[k + 1])
            .collect();
        assert_eq!(maxima, vec![60, 108]);
        assert!(env[84] < env[60] && env[84] < env[108]);
    }

    #[test]
    fn test_envelope_passes_through_partials() {
        let mags = [1.0, 4.0, 2.0, 2.0, 8.0, 1.0, 3.0];
        let env = spectral_envelope(&mags);
        assert_relative_eq!(env[1], 4.0 + LOG_FLOOR, epsilon = 1e-9);
        assert_relative_eq!(env[4], 8.0 + LOG_FLOOR, epsilon = 1e-9);
        // geometric midpoint between the anchors at bins 1 and 4
        assert!(env[2] > 4.0 && env[3] < 8.0);
        assert_relative_eq!(env[2], 4.0 * 2f64.powf(1.0 / 3.0), epsilon = 1e-6);
        assert_relative_eq!(env[6], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_envelope_empty() {
        assert!(spectral_envelope(&[]).is_empty());
    }
}
