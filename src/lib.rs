// src/lib.rs

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub mod api;
#[cfg(feature = "cli")]
pub mod app_logic;
pub mod config;
pub mod epfm;
pub mod error;
pub mod expression;
pub mod fatigue;
pub mod geometry;
pub mod material;
pub mod quadrature;
pub mod r_curve;
pub mod report;
pub mod units;

pub use error::{FractureError, Result};
pub use fatigue::{fit_paris_law, predict_cycles, FatigueIntegrator, ParisLaw};
pub use r_curve::{find_instability_load, InstabilityAnalyzer, ResistanceCurve, Stability};

// When the "wasm" feature is enabled, expose the life prediction and the request layer to the host.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = predictCycles)]
pub fn predict_cycles_js(
    c: f64,
    m: f64,
    stress_range: f64,
    a_initial: f64,
    a_final: f64,
    geometry_factor: f64,
) -> std::result::Result<f64, JsValue> {
    predict_cycles(c, m, stress_range, a_initial, a_final, geometry_factor)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// The response (or error body) is returned as a JSON string.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = handleRequest)]
pub fn handle_request(route: &str, body: &str) -> std::result::Result<String, JsValue> {
    match api::handle(route, body) {
        Ok(value) => Ok(value.to_string()),
        Err(err) => Err(JsValue::from_str(&err.to_json().to_string())),
    }
}
