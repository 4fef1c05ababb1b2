//! The three analysis pipelines and their single dispatch point.
//!
//! - **Signal dynamics**: optional band-pass/decimation, τ estimation,
//!   Takens embedding, PCA alignment, smoothing, downsampling,
//!   normalization.
//! - **Resonance geometry**: spectral formant track, then a Lissajous,
//!   cymatics or Lissajous-manifold generator.
//! - **LPC vowel space**: LPC formant track projected into Bark space.
//!
//! Every pipeline is a pure function of its request: no state survives a
//! call, and insufficient input yields empty results instead of errors.

use serde::{Deserialize, Serialize};

use crate::config::{PcaMode, PeakRanking, ProcessingMode, RootDeflation};
use crate::embedding::{auto_tau, preprocess, takens_embedding};
use crate::formant::{signal_to_lpc_formants, LpcFormantFrame};
use crate::geometry::{cymatics, lissajous, lissajous_manifold, vowel_space};
use crate::manifold::{downsample, normalize, smooth};
use crate::pca::pca_align;
use crate::point::{LpcPoint3D, Point3D};
use crate::signal::Signal;
use crate::spectral::{signal_to_formant_track, FormantFrame};

/// Parameters of the signal-dynamics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingParams {
    /// Fixed delay, used when `auto_tau` is off.
    pub tau: usize,
    pub auto_tau: bool,
    /// Laplacian smoothing passes.
    pub smoothing: usize,
    pub normalize: bool,
    /// Band-pass and decimate to about 1 kHz first.
    pub preprocess: bool,
    pub pca_align: bool,
    pub pca_mode: PcaMode,
}

/// Parameters of the resonance-geometry pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralParams {
    pub window_ms: f64,
    pub ranking: PeakRanking,
}

/// Parameters of the LPC vowel-space pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LpcParams {
    pub window_ms: f64,
    pub deflation: RootDeflation,
}

/// Geometry drawn from a spectral formant track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResonanceShape {
    Lissajous,
    Cymatics,
    LissajousManifold,
}

/// One analysis request: the signal, the output cap, and the parameters of
/// exactly one mode.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisRequest<'a> {
    SignalDynamics {
        signal: &'a Signal,
        max_points: usize,
        params: EmbeddingParams,
    },
    Lissajous {
        signal: &'a Signal,
        max_points: usize,
        params: SpectralParams,
    },
    Cymatics {
        signal: &'a Signal,
        max_points: usize,
        params: SpectralParams,
    },
    LissajousManifold {
        signal: &'a Signal,
        max_points: usize,
        params: SpectralParams,
    },
    LpcVowelSpace {
        signal: &'a Signal,
        max_points: usize,
        params: LpcParams,
    },
}

impl AnalysisRequest<'_> {
    pub fn mode(&self) -> ProcessingMode {
        match self {
            Self::SignalDynamics { .. } => ProcessingMode::SignalDynamics,
            Self::Lissajous { .. } => ProcessingMode::Lissajous,
            Self::Cymatics { .. } => ProcessingMode::Cymatics,
            Self::LissajousManifold { .. } => ProcessingMode::LissajousManifold,
            Self::LpcVowelSpace { .. } => ProcessingMode::LpcVowelSpace,
        }
    }
}

/// Result of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisResponse {
    SignalDynamics {
        points: Vec<Point3D>,
        computed_tau: usize,
    },
    Resonance {
        points: Vec<Point3D>,
        formant_trajectory: Vec<FormantFrame>,
    },
    LpcVowelSpace {
        points: Vec<LpcPoint3D>,
        formant_trajectory: Vec<LpcFormantFrame>,
    },
}

impl AnalysisResponse {
    /// Number of returned points.
    pub fn n_points(&self) -> usize {
        match self {
            Self::SignalDynamics { points, .. } | Self::Resonance { points, .. } => points.len(),
            Self::LpcVowelSpace { points, .. } => points.len(),
        }
    }

    /// Geometry points without per-point extras.
    pub fn points(&self) -> Vec<Point3D> {
        match self {
            Self::SignalDynamics { points, .. } | Self::Resonance { points, .. } => points.clone(),
            Self::LpcVowelSpace { points, .. } => points.iter().map(|p| p.point).collect(),
        }
    }

    /// τ used by the signal-dynamics pipeline.
    pub fn computed_tau(&self) -> Option<usize> {
        match self {
            Self::SignalDynamics { computed_tau, .. } => Some(*computed_tau),
            _ => None,
        }
    }

    /// Number of formant frames (0 for signal dynamics).
    pub fn n_frames(&self) -> usize {
        match self {
            Self::SignalDynamics { .. } => 0,
            Self::Resonance {
                formant_trajectory, ..
            } => formant_trajectory.len(),
            Self::LpcVowelSpace {
                formant_trajectory, ..
            } => formant_trajectory.len(),
        }
    }
}

/// Run a request to completion.
pub fn analyze(request: &AnalysisRequest<'_>) -> AnalysisResponse {
    match *request {
        AnalysisRequest::SignalDynamics {
            signal,
            max_points,
            params,
        } => {
            let (points, computed_tau) = signal_dynamics(signal, max_points, &params);
            AnalysisResponse::SignalDynamics {
                points,
                computed_tau,
            }
        }
        AnalysisRequest::Lissajous {
            signal,
            max_points,
            params,
        } => resonance(signal, ResonanceShape::Lissajous, max_points, &params),
        AnalysisRequest::Cymatics {
            signal,
            max_points,
            params,
        } => resonance(signal, ResonanceShape::Cymatics, max_points, &params),
        AnalysisRequest::LissajousManifold {
            signal,
            max_points,
            params,
        } => resonance(signal, ResonanceShape::LissajousManifold, max_points, &params),
        AnalysisRequest::LpcVowelSpace {
            signal,
            max_points,
            params,
        } => {
            let (points, formant_trajectory) = lpc_vowel_space(signal, max_points, &params);
            AnalysisResponse::LpcVowelSpace {
                points,
                formant_trajectory,
            }
        }
    }
}

fn resonance(
    signal: &Signal,
    shape: ResonanceShape,
    max_points: usize,
    params: &SpectralParams,
) -> AnalysisResponse {
    let (points, formant_trajectory) = resonance_geometry(signal, shape, max_points, params);
    AnalysisResponse::Resonance {
        points,
        formant_trajectory,
    }
}

/// Delay-embed a signal and post-process the trajectory.
///
/// Algorithm steps:
/// 1. Optionally band-pass (60-4000 Hz) and decimate to about 1 kHz
/// 2. Pick τ: autocorrelation estimate or the fixed value
/// 3. Takens embedding
/// 4. PCA alignment (10 points or more)
/// 5. Laplacian smoothing
/// 6. Stride downsample to `max_points`
/// 7. Normalize into the unit sphere
///
/// # Returns
///
/// (points, τ actually used)
pub fn signal_dynamics(
    signal: &Signal,
    max_points: usize,
    params: &EmbeddingParams,
) -> (Vec<Point3D>, usize) {
    let samples = signal.to_f64();
    let samples = if params.preprocess {
        let (filtered, rate) = preprocess(&samples, signal.sample_rate() as f64);
        tracing::debug!(n_samples = filtered.len(), rate, "preprocessed for embedding");
        filtered
    } else {
        samples
    };

    let tau = if params.auto_tau {
        auto_tau(&samples)
    } else {
        params.tau.max(1)
    };

    let mut points = takens_embedding(&samples, tau);
    if params.pca_align {
        points = pca_align(&points, params.pca_mode);
    }
    if params.smoothing > 0 {
        points = smooth(&points, params.smoothing);
    }
    points = downsample(&points, max_points);
    if params.normalize {
        points = normalize(&points);
    }

    tracing::debug!(
        tau,
        auto_tau = params.auto_tau,
        points = points.len(),
        "signal dynamics"
    );
    (points, tau)
}

/// Spectral formant track and the geometry drawn from it.
pub fn resonance_geometry(
    signal: &Signal,
    shape: ResonanceShape,
    max_points: usize,
    params: &SpectralParams,
) -> (Vec<Point3D>, Vec<FormantFrame>) {
    let track = signal_to_formant_track(signal, params.window_ms, params.ranking);
    let points = match shape {
        ResonanceShape::Lissajous => lissajous(&track, max_points),
        ResonanceShape::Cymatics => cymatics(&track, max_points),
        ResonanceShape::LissajousManifold => lissajous_manifold(&track, max_points),
    };
    tracing::debug!(?shape, frames = track.len(), points = points.len(), "resonance geometry");
    (points, track)
}

/// LPC formant track projected into the Bark vowel space.
pub fn lpc_vowel_space(
    signal: &Signal,
    max_points: usize,
    params: &LpcParams,
) -> (Vec<LpcPoint3D>, Vec<LpcFormantFrame>) {
    let track = signal_to_lpc_formants(signal, params.window_ms, params.deflation);
    let points = vowel_space(&track, max_points);
    (points, track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine_signal(freq: f64, sample_rate: u32, seconds: f64) -> Signal {
        let n = (sample_rate as f64 * seconds) as usize;
        let samples: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() as f32)
            .collect();
        Signal::from_slice(&samples, sample_rate).unwrap()
    }

    fn params() -> EmbeddingParams {
        AnalysisConfig::default().embedding_params()
    }

    #[test]
    fn test_signal_dynamics_fixed_tau() {
        let signal = sine_signal(440.0, 44100, 0.1);
        let p = EmbeddingParams {
            auto_tau: false,
            tau: 10,
            pca_align: false,
            normalize: false,
            ..params()
        };
        let (points, tau) = signal_dynamics(&signal, 100_000, &p);
        assert_eq!(tau, 10);
        assert_eq!(points.len(), signal.n_samples() - 20);
    }

    #[test]
    fn test_signal_dynamics_normalized_and_capped() {
        let signal = sine_signal(220.0, 44100, 0.25);
        let (points, tau) = signal_dynamics(&signal, 500, &params());
        assert!(points.len() <= 500);
        assert!(tau >= 5);
        let r = points.iter().map(Point3D::norm).fold(0.0, f64::max);
        assert_relative_eq!(r, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_signal_dynamics_preprocess_shrinks_input() {
        let signal = sine_signal(200.0, 44100, 0.5);
        let p = EmbeddingParams {
            preprocess: true,
            auto_tau: false,
            tau: 3,
            ..params()
        };
        let (points, _) = signal_dynamics(&signal, 100_000, &p);
        // 22050 samples at stride 44 -> 502, minus 2τ
        assert_eq!(points.len(), 502 - 6);
    }

    #[test]
    fn test_signal_dynamics_too_short() {
        let signal = Signal::from_slice(&[0.1, 0.2, 0.3], 8000).unwrap();
        let p = EmbeddingParams {
            auto_tau: false,
            ..params()
        };
        let (points, tau) = signal_dynamics(&signal, 100, &p);
        assert!(points.is_empty());
        assert_eq!(tau, 10);
    }

    #[test]
    fn test_dispatch_matches_mode() {
        let signal = sine_signal(300.0, 16000, 0.3);
        for mode in [
            ProcessingMode::SignalDynamics,
            ProcessingMode::Lissajous,
            ProcessingMode::Cymatics,
            ProcessingMode::LissajousManifold,
            ProcessingMode::LpcVowelSpace,
        ] {
            let cfg = AnalysisConfig {
                max_points: 400,
                ..AnalysisConfig::default()
            }
            .with_mode(mode);
            let request = cfg.to_request(&signal);
            assert_eq!(request.mode(), mode);

            let response = analyze(&request);
            assert!(response.n_points() <= 400);
            match (mode, &response) {
                (ProcessingMode::SignalDynamics, AnalysisResponse::SignalDynamics { .. }) => {
                    assert!(response.computed_tau().is_some());
                }
                (ProcessingMode::LpcVowelSpace, AnalysisResponse::LpcVowelSpace { .. }) => {
                    assert!(response.n_frames() > 0);
                }
                (_, AnalysisResponse::Resonance { .. }) => {
                    assert!(response.n_frames() > 0);
                    assert!(response.n_points() > 0);
                }
                other => panic!("unexpected response for {:?}", other.0),
            }
        }
    }

    #[test]
    fn test_response_serializes_with_tag() {
        let response = AnalysisResponse::SignalDynamics {
            points: vec![Point3D::new(1.0, 0.0, 0.0, 0.0)],
            computed_tau: 12,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"kind\":\"signal-dynamics\""));
        assert!(json.contains("\"computed_tau\":12"));
        let back: AnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
