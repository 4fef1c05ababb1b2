//! WASM bindings for phonoscope.
//!
//! The browser side runs each analysis in a worker. A request carries the
//! samples, the sample rate, an [`AnalysisConfig`] as JSON and a
//! caller-chosen request id; the returned [`Analysis`] echoes that id so
//! the consumer can discard stale results ("last request wins"). The core
//! never cancels a running request.
//!
//! # Usage from JavaScript
//!
//! ```javascript
//! import init, { analyze } from './pkg/phonoscope.js';
//!
//! await init();
//!
//! const config = JSON.stringify({ mode: "lpc-vowel-space", window_ms: 25 });
//! const result = analyze(samples, 44100, config, ++lastRequestId);
//! if (result.request_id === lastRequestId) {
//!   const xyzt = result.points();      // Float32Array, 4 values per point
//!   const alpha = result.opacities();  // Float32Array, LPC mode only
//!   const f1 = result.formant_values(1);
//! }
//! ```
//!
//! # Building for WASM
//!
//! ```bash
//! wasm-pack build --target web --features wasm
//! ```

use wasm_bindgen::prelude::*;

use crate::config::AnalysisConfig;
use crate::pipeline::AnalysisResponse;
use crate::signal::Signal;

/// Initialize the WASM module.
///
/// Sets up the panic hook for readable errors in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Result of one analysis request.
#[wasm_bindgen]
pub struct Analysis {
    request_id: u32,
    response: AnalysisResponse,
}

#[wasm_bindgen]
impl Analysis {
    /// Id passed with the request.
    #[wasm_bindgen(getter)]
    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    pub fn n_points(&self) -> usize {
        self.response.n_points()
    }

    pub fn n_frames(&self) -> usize {
        self.response.n_frames()
    }

    /// Flat x, y, z, t per point.
    pub fn points(&self) -> Vec<f32> {
        self.response
            .points()
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32, p.t as f32])
            .collect()
    }

    /// Per-point opacity (empty outside LPC mode).
    pub fn opacities(&self) -> Vec<f32> {
        match &self.response {
            AnalysisResponse::LpcVowelSpace { points, .. } => {
                points.iter().map(|p| p.opacity as f32).collect()
            }
            _ => Vec::new(),
        }
    }

    /// τ used by signal-dynamics mode.
    pub fn computed_tau(&self) -> Option<u32> {
        self.response.computed_tau().map(|t| t as u32)
    }

    /// Frame times in seconds.
    pub fn times(&self) -> Vec<f64> {
        match &self.response {
            AnalysisResponse::SignalDynamics { .. } => Vec::new(),
            AnalysisResponse::Resonance {
                formant_trajectory, ..
            } => formant_trajectory.iter().map(|f| f.time).collect(),
            AnalysisResponse::LpcVowelSpace {
                formant_trajectory, ..
            } => formant_trajectory.iter().map(|f| f.time).collect(),
        }
    }

    /// Formant n (1-based) of every frame.
    pub fn formant_values(&self, formant_num: usize) -> Vec<f64> {
        if !(1..=3).contains(&formant_num) {
            return Vec::new();
        }
        match &self.response {
            AnalysisResponse::SignalDynamics { .. } => Vec::new(),
            AnalysisResponse::Resonance {
                formant_trajectory, ..
            } => formant_trajectory
                .iter()
                .map(|f| f.formants()[formant_num - 1])
                .collect(),
            AnalysisResponse::LpcVowelSpace {
                formant_trajectory, ..
            } => formant_trajectory
                .iter()
                .map(|f| f.formants()[formant_num - 1])
                .collect(),
        }
    }

    /// Bandwidth n (1-based) of every frame (LPC mode only).
    pub fn bandwidth_values(&self, formant_num: usize) -> Vec<f64> {
        match &self.response {
            AnalysisResponse::LpcVowelSpace {
                formant_trajectory, ..
            } if (1..=3).contains(&formant_num) => formant_trajectory
                .iter()
                .map(|f| f.bandwidths()[formant_num - 1])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whole response as JSON.
    pub fn to_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.response).map_err(|e| JsError::new(&e.to_string()))
    }
}

/// Run one analysis request.
///
/// # Arguments
///
/// * `samples` - Mono samples as Float32Array
/// * `sample_rate` - Sample rate in Hz
/// * `config_json` - `AnalysisConfig` as JSON; missing fields use defaults
/// * `request_id` - Echoed back on the result
///
/// # Errors
///
/// Throws on an invalid signal or unparsable config.
#[wasm_bindgen]
pub fn analyze(
    samples: &[f32],
    sample_rate: u32,
    config_json: &str,
    request_id: u32,
) -> Result<Analysis, JsError> {
    let signal = Signal::from_slice(samples, sample_rate)?;
    let config = AnalysisConfig::from_json(config_json)?;
    Ok(Analysis {
        request_id,
        response: signal.analyze(&config),
    })
}

/// Run one analysis request on WAV file bytes (channel 0).
#[wasm_bindgen]
pub fn analyze_wav(
    wav_bytes: &[u8],
    config_json: &str,
    request_id: u32,
) -> Result<Analysis, JsError> {
    let signal = Signal::from_wav_bytes(wav_bytes)?;
    let config = AnalysisConfig::from_json(config_json)?;
    Ok(Analysis {
        request_id,
        response: signal.analyze(&config),
    })
}

/// Default configuration as JSON, for building requests on the JS side.
#[wasm_bindgen]
pub fn default_config() -> Result<String, JsError> {
    Ok(AnalysisConfig::default().to_json()?)
}
