//! Spectral formant engine - FFT envelope peaks over time.
//!
//! The signal is cut into Hanning-tapered frames of `window_ms` with a 50%
//! hop. Each frame goes through the FFT kernel and the harmonic envelope
//! (see [`crate::spectrum`]); local maxima of the envelope inside
//! 200-4000 Hz are ranked, the best three are kept and sorted ascending to
//! give F1 ≤ F2 ≤ F3.
//!
//! # Ranking Policies
//!
//! - [`PeakRanking::Magnitude`]: envelope value at the peak (plain spectral
//!   path).
//! - [`PeakRanking::Prominence`]: peak value minus its lower neighbor
//!   (resonance geometry path).
//!
//! Missing slots fall back to 500 / 1500 / 2500 Hz and the three values are
//! re-sorted, so downstream generators never see NaN or an unordered frame.

use serde::{Deserialize, Serialize};

use crate::config::PeakRanking;
use crate::signal::Signal;
use crate::spectrum::{hanning_window, FftKernel};

/// Lowest frequency accepted as a formant.
pub const FORMANT_MIN_HZ: f64 = 200.0;

/// Highest frequency accepted as a formant.
pub const FORMANT_MAX_HZ: f64 = 4000.0;

/// Fallback F1, F2, F3 when fewer than three peaks are found.
pub const DEFAULT_FORMANTS: [f64; 3] = [500.0, 1500.0, 2500.0];

/// Formant frequencies of one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormantFrame {
    /// Frame center in seconds.
    pub time: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    /// At least one slot holds a default value.
    pub degenerate: bool,
}

impl FormantFrame {
    pub fn new(time: f64, formants: [f64; 3], degenerate: bool) -> Self {
        Self {
            time,
            f1: formants[0],
            f2: formants[1],
            f3: formants[2],
            degenerate,
        }
    }

    #[inline]
    pub fn formants(&self) -> [f64; 3] {
        [self.f1, self.f2, self.f3]
    }
}

/// A local maximum of a spectral envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Bin frequency in Hz.
    pub frequency: f64,
    /// Envelope value at the peak.
    pub magnitude: f64,
    /// Ranking score under the active policy.
    pub score: f64,
}

/// Start offsets of analysis frames of `window_len` samples with 50% hop.
///
/// Only frames that fit entirely inside the signal are produced.
pub(crate) fn frame_starts(n_samples: usize, window_len: usize) -> Vec<usize> {
    if window_len == 0 || n_samples < window_len {
        return Vec::new();
    }
    let hop = (window_len / 2).max(1);
    (0..=n_samples - window_len).step_by(hop).collect()
}

/// Window length in samples for a duration in milliseconds.
#[inline]
pub(crate) fn window_samples(sample_rate: f64, window_ms: f64) -> usize {
    (sample_rate * window_ms / 1000.0).round() as usize
}

/// Find and rank envelope peaks inside the formant band.
///
/// A peak is a bin strictly greater than both neighbors. The result is
/// ordered best first; ties keep ascending frequency order.
///
/// # Arguments
///
/// * `envelope` - Magnitude envelope
/// * `df` - Bin width in Hz
/// * `ranking` - Ranking policy
pub fn pick_peaks(envelope: &[f64], df: f64, ranking: PeakRanking) -> Vec<SpectralPeak> {
    let mut peaks = Vec::new();
    if envelope.len() < 3 {
        return peaks;
    }

    for k in 1..envelope.len() - 1 {
        let frequency = k as f64 * df;
        if !(FORMANT_MIN_HZ..=FORMANT_MAX_HZ).contains(&frequency) {
            continue;
        }
        let (left, mid, right) = (envelope[k - 1], envelope[k], envelope[k + 1]);
        if mid > left && mid > right {
            let score = match ranking {
                PeakRanking::Magnitude => mid,
                PeakRanking::Prominence => mid - left.min(right),
            };
            peaks.push(SpectralPeak {
                frequency,
                magnitude: mid,
                score,
            });
        }
    }

    peaks.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    peaks
}

/// Turn ranked peaks into an ordered (F1, F2, F3) triple.
///
/// Returns the triple and whether any slot was defaulted.
pub fn formants_from_peaks(peaks: &[SpectralPeak]) -> ([f64; 3], bool) {
    let mut top: Vec<f64> = peaks.iter().take(3).map(|p| p.frequency).collect();
    top.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let degenerate = top.len() < 3;
    let mut formants = DEFAULT_FORMANTS;
    formants[..top.len()].copy_from_slice(&top);
    formants.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    (formants, degenerate)
}

/// Compute the spectral formant trajectory of a signal.
///
/// Algorithm steps:
/// 1. Cut Hanning-tapered frames of `window_ms` with a 50% hop
/// 2. Zero-pad each frame to the next power of two and FFT it
/// 3. Bridge the harmonic comb into an envelope
/// 4. Rank the envelope peaks in 200-4000 Hz and keep the best three
///
/// Signals shorter than one window produce an empty trajectory.
///
/// # Arguments
///
/// * `signal` - Input signal
/// * `window_ms` - Window length in milliseconds
/// * `ranking` - Peak ranking policy
pub fn signal_to_formant_track(
    signal: &Signal,
    window_ms: f64,
    ranking: PeakRanking,
) -> Vec<FormantFrame> {
    let sample_rate = signal.sample_rate() as f64;
    let samples = signal.to_f64();
    let window_len = window_samples(sample_rate, window_ms);

    let starts = frame_starts(samples.len(), window_len);
    if window_len < 3 || starts.is_empty() {
        tracing::debug!(
            n_samples = samples.len(),
            window_len,
            "signal shorter than one spectral window"
        );
        return Vec::new();
    }

    let window = hanning_window(window_len);
    let mut kernel = FftKernel::for_frame_len(window_len);
    let mut frame = vec![0.0; window_len];

    let track: Vec<FormantFrame> = starts
        .iter()
        .map(|&start| {
            for ((dst, &s), &w) in frame
                .iter_mut()
                .zip(&samples[start..start + window_len])
                .zip(&window)
            {
                *dst = s * w;
            }

            let spectrum = kernel.magnitude_spectrum(&frame, sample_rate);
            let envelope = spectrum.envelope();
            let peaks = pick_peaks(
                envelope.as_slice().unwrap_or(&[]),
                spectrum.df(),
                ranking,
            );
            let (formants, degenerate) = formants_from_peaks(&peaks);

            let time = (start as f64 + window_len as f64 / 2.0) / sample_rate;
            FormantFrame::new(time, formants, degenerate)
        })
        .collect();

    tracing::debug!(
        frames = track.len(),
        fft_size = kernel.size(),
        ?ranking,
        "spectral formant track"
    );
    track
}

/// Mean F1, F2, F3 over a trajectory (defaults when empty).
pub fn mean_formants(track: &[FormantFrame]) -> [f64; 3] {
    if track.is_empty() {
        return DEFAULT_FORMANTS;
    }
    let n = track.len() as f64;
    let mut sum = [0.0; 3];
    for frame in track {
        for (acc, f) in sum.iter_mut().zip(frame.formants()) {
            *acc += f;
        }
    }
    sum.map(|s| s / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tone(freq: f64, sample_rate: u32, seconds: f64) -> Signal {
        let n = (sample_rate as f64 * seconds) as usize;
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() as f32
            })
            .collect();
        Signal::from_slice(&samples, sample_rate).unwrap()
    }

    #[test]
    fn test_frame_starts_half_hop() {
        assert_eq!(frame_starts(10, 4), vec![0, 2, 4, 6]);
        assert_eq!(frame_starts(3, 4), Vec::<usize>::new());
        assert_eq!(frame_starts(4, 4), vec![0]);
        assert_eq!(frame_starts(5, 1), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_pick_peaks_band_and_rankings() {
        // df = 100 Hz: bins 1 (100 Hz, out of band), 5, 10, 20, 45 (out)
        let mut env = vec![1.0; 50];
        env[1] = 9.0;
        env[5] = 3.0;
        env[10] = 5.0;
        env[11] = 4.9;
        env[20] = 4.0;
        env[45] = 8.0;

        let by_mag = pick_peaks(&env, 100.0, PeakRanking::Magnitude);
        let freqs: Vec<f64> = by_mag.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![1000.0, 2000.0, 500.0]);

        let by_prom = pick_peaks(&env, 100.0, PeakRanking::Prominence);
        let freqs: Vec<f64> = by_prom.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![1000.0, 2000.0, 500.0]);
        assert_relative_eq!(by_prom[0].score, 4.0);
        assert_relative_eq!(by_prom[1].score, 3.0);
    }

    #[test]
    fn test_prominence_differs_from_magnitude() {
        // tall peak on a high shoulder vs small isolated peak
        let mut env = vec![1.0; 40];
        env[9] = 9.0;
        env[10] = 10.0;
        env[11] = 9.5;
        env[30] = 4.0;
        let by_mag = pick_peaks(&env, 100.0, PeakRanking::Magnitude);
        let by_prom = pick_peaks(&env, 100.0, PeakRanking::Prominence);
        assert_relative_eq!(by_mag[0].frequency, 1000.0);
        assert_relative_eq!(by_prom[0].frequency, 3000.0);
    }

    #[test]
    fn test_formants_from_peaks_defaults_and_order() {
        let (f, degenerate) = formants_from_peaks(&[]);
        assert_eq!(f, DEFAULT_FORMANTS);
        assert!(degenerate);

        let peaks = [
            SpectralPeak { frequency: 3500.0, magnitude: 1.0, score: 2.0 },
            SpectralPeak { frequency: 3000.0, magnitude: 1.0, score: 1.0 },
        ];
        let (f, degenerate) = formants_from_peaks(&peaks);
        assert!(degenerate);
        assert_eq!(f, [500.0, 3000.0, 3500.0]);
    }

    #[test]
    fn test_silence_gives_default_formants() {
        let signal = Signal::from_slice(&vec![0.0; 22050], 44100).unwrap();
        let track = signal_to_formant_track(&signal, 25.0, PeakRanking::Magnitude);
        assert!(!track.is_empty());
        for frame in &track {
            assert_eq!(frame.formants(), DEFAULT_FORMANTS);
            assert!(frame.degenerate);
        }
    }

    #[test]
    fn test_tone_is_localized() {
        let signal = tone(2500.0, 44100, 0.5);
        for ranking in [PeakRanking::Magnitude, PeakRanking::Prominence] {
            let track = signal_to_formant_track(&signal, 25.0, ranking);
            assert_eq!(track.len(), 39);
            for frame in &track {
                assert!(
                    frame
                        .formants()
                        .iter()
                        .any(|f| (f - 2500.0).abs() / 2500.0 < 0.05),
                    "{:?} {:?}",
                    ranking,
                    frame
                );
                assert!(frame.f1 <= frame.f2 && frame.f2 <= frame.f3);
            }
        }
    }

    #[test]
    fn test_close_front_vowel_is_resolved() {
        let expected = [270.0, 2290.0, 3010.0];
        let signal =
            crate::synth::vowel(120.0, expected, crate::synth::DEFAULT_BANDWIDTHS, 44100, 0.5)
                .unwrap();
        for ranking in [PeakRanking::Magnitude, PeakRanking::Prominence] {
            let track = signal_to_formant_track(&signal, 25.0, ranking);
            assert_eq!(track.len(), 39);
            // a steady vowel lands on the same partials in every frame
            for frame in &track {
                assert_eq!(frame.formants(), track[0].formants(), "{:?}", ranking);
                assert!(!frame.degenerate);
            }
            for (f, e) in track[0].formants().iter().zip(expected) {
                assert!((f - e).abs() / e < 0.15, "{:?}: {} vs {}", ranking, f, e);
            }
        }
    }

    #[test]
    fn test_short_signal_is_empty() {
        let signal = Signal::from_slice(&[0.1; 100], 44100).unwrap();
        assert!(signal_to_formant_track(&signal, 25.0, PeakRanking::Magnitude).is_empty());
    }

    #[test]
    fn test_mean_formants() {
        let track = vec![
            FormantFrame::new(0.0, [400.0, 1400.0, 2400.0], false),
            FormantFrame::new(0.1, [600.0, 1600.0, 2600.0], false),
        ];
        assert_eq!(mean_formants(&track), [500.0, 1500.0, 2500.0]);
        assert_eq!(mean_formants(&[]), DEFAULT_FORMANTS);
    }
}
