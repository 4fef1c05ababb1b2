//! Signal - Single-channel audio samples with sample rate.
//!
//! This is the input type for every analysis pipeline in phonoscope.
//!
//! # Single Channel
//!
//! Only one channel is ever analyzed. Multi-channel WAV files are accepted,
//! but only channel 0 is kept.
//!
//! # Sample Format
//!
//! Samples are stored as 32-bit floats, normalized to [-1.0, 1.0] for
//! integer WAV formats. Analysis code promotes them to `f64` internally.
//! A `Signal` is immutable once built; pipelines only ever borrow it.

use std::io::{Cursor, Read};
use std::path::Path;

use ndarray::Array1;

use crate::config::{AnalysisConfig, PeakRanking, RootDeflation};
use crate::error::{Error, Result};
use crate::formant::LpcFormantFrame;
use crate::pipeline::AnalysisResponse;
use crate::spectral::FormantFrame;

/// Audio samples with sample rate.
///
/// # Example
///
/// ```no_run
/// use phonoscope::{AnalysisConfig, Signal};
///
/// let signal = Signal::from_file("vowel.wav").unwrap();
/// let response = signal.analyze(&AnalysisConfig::default());
/// println!("{} points", response.n_points());
/// ```
#[derive(Debug, Clone)]
pub struct Signal {
    /// Audio samples as a 1D array.
    samples: Array1<f32>,

    /// Sample rate in Hz (always > 0).
    sample_rate: u32,
}

impl Signal {
    /// Create a Signal from samples and sample rate.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidParameter` if `sample_rate` is zero or any sample
    ///   is NaN or infinite
    pub fn new(samples: Array1<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidParameter(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "sample {} is not finite",
                idx
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a Signal from a slice of samples.
    ///
    /// Convenience constructor that copies data from a slice.
    pub fn from_slice(samples: &[f32], sample_rate: u32) -> Result<Self> {
        Self::new(Array1::from_vec(samples.to_vec()), sample_rate)
    }

    /// Load audio from a WAV file.
    ///
    /// Multi-channel files are accepted; only channel 0 is kept.
    ///
    /// # Sample Format Handling
    ///
    /// - **Integer formats** (8, 16, 24, 32 bit): normalized to [-1.0, 1.0]
    ///   by dividing by 2^(bits-1)
    /// - **Float formats**: loaded as-is
    ///
    /// # Errors
    ///
    /// - `Error::AudioRead` if the file cannot be read
    /// - `Error::InvalidParameter` if the decoded data is not usable
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_wav_reader(hound::WavReader::open(path)?)
    }

    /// Decode WAV data already held in memory.
    ///
    /// Same format handling as [`Signal::from_file`].
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_wav_reader(hound::WavReader::new(Cursor::new(bytes))?)
    }

    fn from_wav_reader<R: Read>(reader: hound::WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        let n_channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<f32>, _>>()?
            }
        };

        // Keep channel 0 of the interleaved frames
        let samples: Vec<f32> = interleaved.into_iter().step_by(n_channels).collect();

        if n_channels > 1 {
            tracing::debug!(channels = n_channels, "multi-channel input, using channel 0");
        }

        Self::new(Array1::from_vec(samples), spec.sample_rate)
    }

    /// Get the audio samples.
    #[inline]
    pub fn samples(&self) -> &Array1<f32> {
        &self.samples
    }

    /// Get the samples promoted to `f64` for analysis.
    pub fn to_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| s as f64).collect()
    }

    /// Get the sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns true when the signal holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the total duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.n_samples() as f64 / self.sample_rate as f64
    }

    // ========== Analysis Methods ==========
    //
    // Thin delegates to the analysis modules, mirroring the request
    // surface in `pipeline`.

    /// Run the pipeline selected by `config.mode`.
    ///
    /// The config is sanitized first (τ and window length are clamped to
    /// their valid ranges); the caller's value is not modified.
    pub fn analyze(&self, config: &AnalysisConfig) -> AnalysisResponse {
        crate::pipeline::analyze(&config.to_request(self))
    }

    /// Compute a spectral (FFT envelope) formant trajectory.
    ///
    /// # Arguments
    ///
    /// * `window_ms` - Analysis window length in milliseconds (15-50)
    /// * `ranking` - Peak ranking policy used to choose the top three peaks
    pub fn to_formant_track(&self, window_ms: f64, ranking: PeakRanking) -> Vec<FormantFrame> {
        crate::spectral::signal_to_formant_track(self, window_ms, ranking)
    }

    /// Compute an LPC formant trajectory with bandwidths and dispersion.
    ///
    /// # Arguments
    ///
    /// * `window_ms` - Analysis window length in milliseconds (15-50)
    /// * `deflation` - Root deflation policy of the polynomial root finder
    pub fn to_lpc_formants(&self, window_ms: f64, deflation: RootDeflation) -> Vec<LpcFormantFrame> {
        crate::formant::signal_to_lpc_formants(self, window_ms, deflation)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signal({} samples, {} Hz, {:.3}s)",
            self.n_samples(),
            self.sample_rate,
            self.duration()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_zero_sample_rate() {
        let err = Signal::from_slice(&[0.0; 16], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_rejects_non_finite_samples() {
        let err = Signal::from_slice(&[0.0, f32::NAN, 0.0], 8000).unwrap_err();
        assert!(err.to_string().contains("sample 1"));
    }

    #[test]
    fn test_duration() {
        let signal = Signal::from_slice(&vec![0.0; 22050], 44100).unwrap();
        assert_eq!(signal.n_samples(), 22050);
        assert_relative_eq!(signal.duration(), 0.5);
    }

    #[test]
    fn test_from_file_keeps_channel_zero() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "phonoscope_signal_test_{}.wav",
            std::process::id()
        ));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..10 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-16384i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let signal = Signal::from_file(&path).unwrap();
        assert_eq!(signal.n_samples(), 10);
        assert_eq!(signal.sample_rate(), 8000);
        for &s in signal.samples() {
            assert_relative_eq!(s, 0.5);
        }
        let bytes = std::fs::read(&path).unwrap();
        let from_bytes = Signal::from_wav_bytes(&bytes).unwrap();
        assert_eq!(from_bytes.samples(), signal.samples());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_from_wav_bytes_rejects_garbage() {
        let err = Signal::from_wav_bytes(b"not a wav file").unwrap_err();
        assert!(matches!(err, Error::AudioRead(_)));
    }
}
