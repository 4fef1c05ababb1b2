//! # phonoscope
//!
//! Turns a speech waveform into 3D point clouds for interactive
//! visualization.
//!
//! Three processing modes share one request/response interface:
//!
//! - **Signal dynamics**: Takens delay embedding of the band-limited
//!   signal, with automatic delay selection, optional PCA alignment,
//!   smoothing and normalization
//! - **Resonance geometry**: FFT spectral-envelope formant tracking,
//!   rendered as Lissajous figures, a stability-weighted Lissajous
//!   manifold or Chladni-style cymatics patterns
//! - **LPC vowel space**: autocorrelation LPC at 10 kHz, polynomial roots
//!   via Laguerre's method, projected onto a Bark-scaled F1/F2 plane
//!
//! # Quick Start
//!
//! ```no_run
//! use phonoscope::{AnalysisConfig, ProcessingMode, Signal};
//!
//! // Load a WAV file (channel 0 is used for multi-channel input)
//! let signal = Signal::from_file("audio.wav").unwrap();
//!
//! // Embed the waveform with an automatically chosen delay
//! let config = AnalysisConfig::default().with_mode(ProcessingMode::SignalDynamics);
//! let response = signal.analyze(&config);
//! println!("tau = {:?}, {} points", response.computed_tau(), response.n_points());
//!
//! // Track formants with LPC and read F1 for every frame
//! let config = AnalysisConfig::default().with_mode(ProcessingMode::LpcVowelSpace);
//! let response = signal.analyze(&config);
//! println!("{} frames", response.n_frames());
//! ```
//!
//! # Module Organization
//!
//! Signal-processing stages live in their own modules (`embedding`,
//! `spectral`, `formant`, `roots`, `pca`, `manifold`), each with plain
//! functions over slices. `geometry` turns formant tracks into point
//! clouds, and `pipeline` dispatches an [`AnalysisRequest`] to the right
//! chain. The `Signal` struct provides convenience methods that delegate
//! to these modules.
//!
//! # Validation
//!
//! `synth` builds vowels with known formants and `validation` compares an
//! extracted trajectory with its targets by per-formant median.

// Module declarations
pub mod config;
pub mod embedding;
pub mod error;
pub mod formant;
pub mod geometry;
pub mod manifold;
pub mod pca;
pub mod pipeline;
pub mod point;
pub mod roots;
pub mod signal;
pub mod spectral;
pub mod spectrum;
pub mod synth;
pub mod validation;

// WASM bindings (enabled with "wasm" feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export main types at crate root for convenient access
//
// Users can import the most common types directly:
//   use phonoscope::{Signal, AnalysisConfig, AnalysisResponse};
//
// Or import from specific modules for less common types:
//   use phonoscope::embedding::{auto_tau, takens_embedding};

/// Error types for phonoscope operations.
pub use error::{Error, Result};

/// Analysis configuration.
///
/// - `AnalysisConfig`: Serializable settings for every mode
/// - `ProcessingMode`: Which chain to run
/// - `PeakRanking`, `RootDeflation`, `PcaMode`: Algorithm variants
pub use config::{AnalysisConfig, PcaMode, PeakRanking, ProcessingMode, RootDeflation};

/// Audio input.
///
/// `Signal` is the foundation type for all analysis.
pub use signal::Signal;

/// Output points.
pub use point::{LpcPoint3D, Point3D};

/// FFT spectral formant tracking.
///
/// - `FormantFrame`: F1-F3 of one analysis frame
/// - `mean_formants`: Per-formant mean over a track
pub use spectral::{mean_formants, FormantFrame};

/// LPC formant tracking.
///
/// - `LpcFormantFrame`: F1-F3 with bandwidths and dispersion
/// - `FormantPoint`: Individual formant (frequency + bandwidth)
pub use formant::{FormantPoint, LpcFormantFrame};

/// Request/response interface and the three processing chains.
pub use pipeline::{
    analyze, lpc_vowel_space, resonance_geometry, signal_dynamics, AnalysisRequest,
    AnalysisResponse, EmbeddingParams, LpcParams, ResonanceShape, SpectralParams,
};

/// Formant validation against known targets.
pub use validation::{median_formants, validate_formants, validate_lpc_formants, ValidationReport};
