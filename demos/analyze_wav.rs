//! Run every processing mode on a WAV file and print a summary.
//!
//! ```bash
//! RUST_LOG=phonoscope=debug cargo run --example analyze_wav -- speech.wav [config.json]
//! ```
//!
//! Without a path a synthetic /a/ is analyzed instead.

use phonoscope::synth;
use phonoscope::{
    median_formants, AnalysisConfig, AnalysisResponse, ProcessingMode, Signal,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const MODES: [ProcessingMode; 5] = [
    ProcessingMode::SignalDynamics,
    ProcessingMode::Lissajous,
    ProcessingMode::Cymatics,
    ProcessingMode::LissajousManifold,
    ProcessingMode::LpcVowelSpace,
];

fn summarize(response: &AnalysisResponse) {
    match response {
        AnalysisResponse::SignalDynamics {
            points,
            computed_tau,
        } => println!("OK ({} points, tau={})", points.len(), computed_tau),
        AnalysisResponse::Resonance {
            points,
            formant_trajectory,
        } => {
            let [f1, f2, f3] = median_formants(formant_trajectory.iter().map(|f| f.formants()));
            println!(
                "OK ({} points, {} frames, median F1/F2/F3 = {:.0}/{:.0}/{:.0} Hz)",
                points.len(),
                formant_trajectory.len(),
                f1,
                f2,
                f3
            );
        }
        AnalysisResponse::LpcVowelSpace {
            points,
            formant_trajectory,
        } => {
            let [f1, f2, f3] = median_formants(formant_trajectory.iter().map(|f| f.formants()));
            let degenerate = formant_trajectory.iter().filter(|f| f.degenerate).count();
            println!(
                "OK ({} points, {} frames, {} defaulted, median F1/F2/F3 = {:.0}/{:.0}/{:.0} Hz)",
                points.len(),
                formant_trajectory.len(),
                degenerate,
                f1,
                f2,
                f3
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let signal = match args.next() {
        Some(path) => {
            println!("Loading: {}", path);
            Signal::from_file(&path)?
        }
        None => {
            println!("No input given, synthesizing /a/ (F0 120 Hz)");
            synth::vowel(120.0, [730.0, 1090.0, 2440.0], synth::DEFAULT_BANDWIDTHS, 44100, 1.0)?
        }
    };
    let base = match args.next() {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    println!(
        "Signal: {} samples, {} Hz, {:.3}s",
        signal.n_samples(),
        signal.sample_rate(),
        signal.duration()
    );

    for mode in MODES {
        print!("  {:?}... ", mode);
        let start = Instant::now();
        let response = signal.analyze(&base.clone().with_mode(mode));
        summarize(&response);
        println!("    done in {:.2?}", start.elapsed());
    }
    Ok(())
}
