//! Analysis configuration.
//!
//! `AnalysisConfig` is owned by the caller (typically one per file and
//! pipeline) and is only ever read by the core. It serializes to JSON so a
//! host (for instance a browser worker) can pass it across a boundary as
//! text; every field has a default, so partial documents are accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::{AnalysisRequest, EmbeddingParams, LpcParams, SpectralParams};
use crate::signal::Signal;

/// Which pipeline a request runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    /// Takens embedding of the raw waveform.
    SignalDynamics,
    /// Averaged-formant Lissajous curve.
    Lissajous,
    /// Chladni-style standing-wave surface.
    Cymatics,
    /// Time-stacked, stability-weighted Lissajous segments.
    LissajousManifold,
    /// LPC formants projected into a Bark-scale vowel space.
    LpcVowelSpace,
}

impl Default for ProcessingMode {
    fn default() -> Self {
        Self::SignalDynamics
    }
}

/// How spectral peaks are ranked before the top three are kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PeakRanking {
    /// Rank by envelope magnitude at the peak.
    Magnitude,
    /// Rank by peak height above its lower neighbor bin.
    Prominence,
}

impl Default for PeakRanking {
    fn default() -> Self {
        Self::Prominence
    }
}

/// Polynomial deflation used between successive Laguerre root searches.
///
/// `RealOnly` is the default. It may report one root of a conjugate pair
/// twice and miss its partner, but the positive-frequency roots that
/// become formants are unaffected on the vowels tested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RootDeflation {
    /// Deflate only by (near-)real roots; complex roots leave the
    /// polynomial untouched and later seeds may land on them again.
    RealOnly,
    /// Full complex Horner division after every root.
    Complex,
}

impl Default for RootDeflation {
    fn default() -> Self {
        Self::RealOnly
    }
}

/// Rotation applied by the PCA aligner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PcaMode {
    /// Dominant axis becomes x; y and z keep their residual after removing
    /// the projection onto that axis.
    Residual,
    /// Full re-basis onto the three principal axes.
    Full,
}

impl Default for PcaMode {
    fn default() -> Self {
        Self::Residual
    }
}

/// Per-file, per-pipeline analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Embedding delay in samples, used when `auto_tau` is off.
    #[serde(default = "AnalysisConfig::default_tau")]
    pub tau: usize,
    /// Laplacian smoothing passes over the embedded trajectory.
    #[serde(default)]
    pub smoothing: usize,
    /// Center and scale the embedded cloud into the unit sphere.
    #[serde(default = "AnalysisConfig::default_true")]
    pub normalize: bool,
    /// Band-pass and decimate to 1 kHz before embedding.
    #[serde(default)]
    pub preprocess: bool,
    /// Estimate τ from the signal autocorrelation.
    #[serde(default = "AnalysisConfig::default_true")]
    pub auto_tau: bool,
    /// Rotate the embedded cloud onto its dominant axis.
    #[serde(default = "AnalysisConfig::default_true")]
    pub pca_align: bool,
    /// Analysis window length for the spectral and LPC engines.
    #[serde(default = "AnalysisConfig::default_window_ms")]
    pub window_ms: f64,
    #[serde(default)]
    pub mode: ProcessingMode,
    #[serde(default)]
    pub peak_ranking: PeakRanking,
    #[serde(default)]
    pub root_deflation: RootDeflation,
    #[serde(default)]
    pub pca_mode: PcaMode,
    /// Upper bound on the number of returned points.
    #[serde(default = "AnalysisConfig::default_max_points")]
    pub max_points: usize,
}

impl AnalysisConfig {
    pub const TAU_MIN: usize = 1;
    pub const TAU_MAX: usize = 100;
    pub const WINDOW_MS_MIN: f64 = 15.0;
    pub const WINDOW_MS_MAX: f64 = 50.0;

    fn default_tau() -> usize {
        10
    }
    fn default_true() -> bool {
        true
    }
    fn default_window_ms() -> f64 {
        25.0
    }
    fn default_max_points() -> usize {
        5000
    }

    /// Same config with the given mode.
    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Copy with τ and window length clamped to their valid ranges.
    pub fn sanitized(&self) -> Self {
        let mut cfg = self.clone();

        let tau = cfg.tau.clamp(Self::TAU_MIN, Self::TAU_MAX);
        if tau != cfg.tau {
            tracing::warn!(requested = cfg.tau, used = tau, "tau out of range, clamped");
            cfg.tau = tau;
        }

        let window_ms = if cfg.window_ms.is_finite() {
            cfg.window_ms.clamp(Self::WINDOW_MS_MIN, Self::WINDOW_MS_MAX)
        } else {
            Self::default_window_ms()
        };
        if window_ms != cfg.window_ms {
            tracing::warn!(
                requested = cfg.window_ms,
                used = window_ms,
                "window_ms out of range, clamped"
            );
            cfg.window_ms = window_ms;
        }

        cfg
    }

    /// Parameters for the signal-dynamics pipeline.
    pub fn embedding_params(&self) -> EmbeddingParams {
        EmbeddingParams {
            tau: self.tau,
            auto_tau: self.auto_tau,
            smoothing: self.smoothing,
            normalize: self.normalize,
            preprocess: self.preprocess,
            pca_align: self.pca_align,
            pca_mode: self.pca_mode,
        }
    }

    /// Parameters for the lissajous / cymatics / manifold pipelines.
    pub fn spectral_params(&self) -> SpectralParams {
        SpectralParams {
            window_ms: self.window_ms,
            ranking: self.peak_ranking,
        }
    }

    /// Parameters for the LPC vowel-space pipeline.
    pub fn lpc_params(&self) -> LpcParams {
        LpcParams {
            window_ms: self.window_ms,
            deflation: self.root_deflation,
        }
    }

    /// Build the tagged request for `self.mode` over `signal`.
    pub fn to_request<'a>(&self, signal: &'a Signal) -> AnalysisRequest<'a> {
        let cfg = self.sanitized();
        let max_points = cfg.max_points;
        match cfg.mode {
            ProcessingMode::SignalDynamics => AnalysisRequest::SignalDynamics {
                signal,
                max_points,
                params: cfg.embedding_params(),
            },
            ProcessingMode::Lissajous => AnalysisRequest::Lissajous {
                signal,
                max_points,
                params: cfg.spectral_params(),
            },
            ProcessingMode::Cymatics => AnalysisRequest::Cymatics {
                signal,
                max_points,
                params: cfg.spectral_params(),
            },
            ProcessingMode::LissajousManifold => AnalysisRequest::LissajousManifold {
                signal,
                max_points,
                params: cfg.spectral_params(),
            },
            ProcessingMode::LpcVowelSpace => AnalysisRequest::LpcVowelSpace {
                signal,
                max_points,
                params: cfg.lpc_params(),
            },
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write this config to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tau: Self::default_tau(),
            smoothing: 0,
            normalize: true,
            preprocess: false,
            auto_tau: true,
            pca_align: true,
            window_ms: Self::default_window_ms(),
            mode: ProcessingMode::default(),
            peak_ranking: PeakRanking::default(),
            root_deflation: RootDeflation::default(),
            pca_mode: PcaMode::default(),
            max_points: Self::default_max_points(),
        }
    }
}
