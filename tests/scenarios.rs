//! End-to-end analysis of synthetic signals with known structure.

use approx::assert_relative_eq;
use phonoscope::embedding::{auto_tau, takens_embedding, SILENT_TAU};
use phonoscope::formant::DEFAULT_LPC_FORMANTS;
use phonoscope::geometry::{lissajous_manifold, stability_weights, MIN_STABILITY, SEGMENT_POINTS};
use phonoscope::synth;
use phonoscope::{
    analyze, validate_formants, validate_lpc_formants, AnalysisConfig, AnalysisRequest,
    AnalysisResponse, EmbeddingParams, FormantFrame, LpcParams, PcaMode, PeakRanking,
    ProcessingMode, RootDeflation, Signal, SpectralParams,
};
use std::f64::consts::PI;

const CLOSE_FRONT: [f64; 3] = [270.0, 2290.0, 3010.0];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn lpc_tracks_synthetic_vowel() {
    init_tracing();
    let signal = synth::vowel(120.0, CLOSE_FRONT, synth::DEFAULT_BANDWIDTHS, 44100, 0.5).unwrap();

    for deflation in [RootDeflation::RealOnly, RootDeflation::Complex] {
        let request = AnalysisRequest::LpcVowelSpace {
            signal: &signal,
            max_points: 10_000,
            params: LpcParams {
                window_ms: 25.0,
                deflation,
            },
        };
        let response = analyze(&request);

        let AnalysisResponse::LpcVowelSpace {
            points,
            formant_trajectory,
        } = response
        else {
            panic!("wrong response kind");
        };
        assert_eq!(points.len(), formant_trajectory.len());
        assert!(!formant_trajectory.is_empty());

        let report = validate_lpc_formants(&formant_trajectory, CLOSE_FRONT, 0.15);
        assert!(report.passed(), "{:?}: {:?}", deflation, report);

        for p in &points {
            assert!((0.0..=1.0).contains(&p.opacity));
            assert!(p.point.z.abs() <= 0.4 + 1e-12);
        }
    }
}

#[test]
fn spectral_tracks_synthetic_vowel() {
    init_tracing();
    let signal = synth::vowel(120.0, CLOSE_FRONT, synth::DEFAULT_BANDWIDTHS, 44100, 0.5).unwrap();

    for ranking in [PeakRanking::Magnitude, PeakRanking::Prominence] {
        let request = AnalysisRequest::Lissajous {
            signal: &signal,
            max_points: 10_000,
            params: SpectralParams {
                window_ms: 25.0,
                ranking,
            },
        };
        let AnalysisResponse::Resonance {
            formant_trajectory, ..
        } = analyze(&request)
        else {
            panic!("wrong response kind");
        };
        assert!(!formant_trajectory.is_empty());

        let report = validate_formants(&formant_trajectory, CLOSE_FRONT, 0.15);
        assert!(report.passed(), "{:?}: {:?}", ranking, report);
    }
}

#[test]
fn steady_vowel_keeps_manifold_frames() {
    init_tracing();
    let signal = synth::vowel(120.0, CLOSE_FRONT, synth::DEFAULT_BANDWIDTHS, 44100, 0.5).unwrap();
    let config = AnalysisConfig {
        max_points: usize::MAX,
        ..AnalysisConfig::default()
    }
    .with_mode(ProcessingMode::LissajousManifold);

    let AnalysisResponse::Resonance {
        points,
        formant_trajectory,
    } = signal.analyze(&config)
    else {
        panic!("wrong response kind");
    };
    let n_frames = formant_trajectory.len();
    assert!(n_frames > 30);

    // one 20-point segment per kept frame
    let kept = points.len() / SEGMENT_POINTS;
    assert_eq!(points.len() % SEGMENT_POINTS, 0);
    assert!(kept * 10 >= n_frames * 9, "kept {} of {} frames", kept, n_frames);
    let stable = stability_weights(&formant_trajectory)
        .iter()
        .filter(|&&w| w >= MIN_STABILITY)
        .count();
    assert_eq!(stable, kept);
}

#[test]
fn spectral_track_follows_a_tone() {
    init_tracing();
    let signal = synth::sine(2500.0, 16000, 0.5).unwrap();
    let config = AnalysisConfig::default().with_mode(ProcessingMode::Lissajous);
    let response = signal.analyze(&config);

    let AnalysisResponse::Resonance {
        formant_trajectory, ..
    } = response
    else {
        panic!("wrong response kind");
    };
    assert!(!formant_trajectory.is_empty());
    for frame in &formant_trajectory {
        let [f1, f2, f3] = frame.formants();
        assert!(f1 <= f2 && f2 <= f3);
        // the tone dominates every frame
        assert!(
            frame
                .formants()
                .iter()
                .any(|f| (f - 2500.0).abs() < 100.0),
            "{:?}",
            frame
        );
    }
}

#[test]
fn pure_tone_embeds_on_an_ellipse() {
    let sample_rate = 44100u32;
    let freq = 440.0;
    let tau = 10;
    let signal = synth::sine(freq, sample_rate, 0.1).unwrap();

    let params = EmbeddingParams {
        tau,
        auto_tau: false,
        smoothing: 0,
        normalize: false,
        preprocess: false,
        pca_align: false,
        pca_mode: PcaMode::Residual,
    };
    let response = analyze(&AnalysisRequest::SignalDynamics {
        signal: &signal,
        max_points: usize::MAX,
        params,
    });
    assert_eq!(response.computed_tau(), Some(tau));

    let points = response.points();
    assert_eq!(points.len(), signal.n_samples() - 2 * tau);

    let phi = 2.0 * PI * freq * tau as f64 / sample_rate as f64;
    for p in &points {
        let ellipse = p.x * p.x - 2.0 * p.x * p.y * phi.cos() + p.y * p.y;
        assert_relative_eq!(ellipse, phi.sin().powi(2), epsilon = 1e-5);
        // sin(θ + 2φ) = 2cos(φ)sin(θ + φ) - sin(θ)
        assert_relative_eq!(p.z, 2.0 * phi.cos() * p.y - p.x, epsilon = 1e-5);
    }

    // one period is about 100 samples
    let period = sample_rate as f64 / freq;
    let lag = period.round() as usize;
    let (a, b) = (points[0], points[lag]);
    assert!((a.x - b.x).abs() < 0.05 && (a.y - b.y).abs() < 0.05);
}

#[test]
fn silence_uses_defaults() {
    init_tracing();
    let signal = synth::silence(44100, 0.5).unwrap();
    assert_eq!(auto_tau(&signal.to_f64()), SILENT_TAU);

    let dynamics = signal.analyze(&AnalysisConfig::default().with_mode(ProcessingMode::SignalDynamics));
    assert_eq!(dynamics.computed_tau(), Some(SILENT_TAU));

    let track = signal.to_lpc_formants(25.0, RootDeflation::Complex);
    assert!(!track.is_empty());
    for frame in &track {
        assert_eq!(frame.formants(), [500.0, 1500.0, 2500.0]);
        assert_eq!(frame.bandwidths(), [80.0, 100.0, 120.0]);
        assert_eq!(
            frame.formants(),
            DEFAULT_LPC_FORMANTS.map(|p| p.frequency)
        );
    }
}

#[test]
fn minimal_embedding_input_is_empty() {
    let samples: Vec<f32> = (0..20).map(|i| i as f32).collect();
    let signal = Signal::from_slice(&samples, 8000).unwrap();
    assert!(takens_embedding(&signal.to_f64(), 10).is_empty());

    let config = AnalysisConfig {
        tau: 10,
        auto_tau: false,
        ..AnalysisConfig::default()
    }
    .with_mode(ProcessingMode::SignalDynamics);
    let response = signal.analyze(&config);
    assert_eq!(response.n_points(), 0);
    assert_eq!(response.computed_tau(), Some(10));
}

#[test]
fn steady_formants_keep_every_manifold_frame() {
    let track: Vec<FormantFrame> = (0..8)
        .map(|i| FormantFrame::new(i as f64 * 0.0125, [700.0, 1200.0, 2600.0], false))
        .collect();
    let points = lissajous_manifold(&track, usize::MAX);
    assert!(!points.is_empty());
    assert!(points.iter().all(|p| p.norm() <= 1.0 + 1e-9));

    let frames: std::collections::BTreeSet<u64> =
        points.iter().map(|p| (p.t * 1e6).round() as u64).collect();
    assert_eq!(frames.len(), track.len());
}

#[test]
fn config_round_trips_through_json() {
    let config = AnalysisConfig {
        tau: 12,
        smoothing: 2,
        window_ms: 30.0,
        ..AnalysisConfig::default()
    }
    .with_mode(ProcessingMode::Cymatics);
    let text = config.to_json().unwrap();
    assert_eq!(AnalysisConfig::from_json(&text).unwrap(), config);
}
