//! JSON request/response layer over the pure calculation functions.
//!
//! Each route takes a JSON body and returns a JSON value or an [`ApiError`] carrying an
//! HTTP-style status code. Nothing here performs I/O; a transport (the CLI, the wasm
//! binding) hands in the route and body.

use std::collections::HashMap;
use std::fmt;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::epfm::{self, Constraint};
use crate::error::FractureError;
use crate::expression::ExpressionCurve;
use crate::fatigue;
use crate::geometry::Geometry;
use crate::r_curve::{InstabilityAnalyzer, PowerLawCurve, ResistanceCurve, Stability, SweepOptions};
use crate::units::StressUnit;

/// A failed request with its status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        ApiError { status: 400, detail: detail.into() }
    }

    pub fn not_found(route: &str) -> Self {
        ApiError { status: 404, detail: format!("Route not found: {}", route) }
    }

    pub fn to_json(&self) -> Value {
        json!({ "detail": self.detail })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.status, self.detail)
    }
}

impl std::error::Error for ApiError {}

impl From<FractureError> for ApiError {
    fn from(err: FractureError) -> Self {
        let status = match err {
            FractureError::NonConvergence { .. } => 422,
            FractureError::InvalidDomain(_) | FractureError::Unsupported(_) | FractureError::Expression(_) => 400,
        };
        ApiError { status, detail: err.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SifRequest {
    pub geometry: String,
    pub width: f64,
    pub crack_length: f64,
    pub stress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SifResponse {
    pub k1: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FatigueRequest {
    pub c: f64,
    pub m: f64,
    pub stress_range: f64,
    pub a_initial: f64,
    pub a_final: f64,
    pub geometry_factor: f64,
    /// Unit of `stress_range`.
    #[serde(default)]
    pub stress_unit: StressUnit,
    /// Stress unit `c` was calibrated in (ΔK in unit·sqrt(m)); defaults to `stress_unit`.
    #[serde(default)]
    pub paris_unit: Option<StressUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FatigueResponse {
    pub cycles: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JIntegralRequest {
    pub k_i: f64,
    pub youngs_modulus: f64,
    #[serde(default = "default_plane_stress")]
    pub plane_stress: bool,
    #[serde(default = "default_poisson_ratio")]
    pub poisson_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JIntegralResponse {
    pub j_integral: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RCurveRequest {
    pub initial_crack: f64,
    #[serde(default = "default_youngs_modulus")]
    pub youngs_modulus: f64,
    #[serde(default = "default_geometry_factor")]
    pub geometry_factor: f64,
    /// Resistance expression in `da`; the demo curve when absent.
    #[serde(default)]
    pub resistance: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, f64>,
    #[serde(default)]
    pub sweep: SweepOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RCurveResponse {
    Unstable {
        critical_stress: f64,
        critical_extension: f64,
        unit_stress: &'static str,
        unit_extension: &'static str,
    },
    Stable {
        message: &'static str,
    },
}

fn default_plane_stress() -> bool {
    true
}

fn default_poisson_ratio() -> f64 {
    0.3
}

fn default_youngs_modulus() -> f64 {
    200e9
}

fn default_geometry_factor() -> f64 {
    1.0
}

pub fn calculate_sif(request: &SifRequest) -> Result<SifResponse, ApiError> {
    if !request.geometry.eq_ignore_ascii_case("CCT") {
        return Err(ApiError::bad_request("Geometry not supported"));
    }
    let specimen = Geometry::from_name(&request.geometry, request.width)?;
    let k1 = specimen.k1(request.stress, request.crack_length)?;
    Ok(SifResponse { k1, unit: "Pa*sqrt(m)" })
}

pub fn calculate_fatigue(request: &FatigueRequest) -> Result<FatigueResponse, ApiError> {
    let paris_unit = request.paris_unit.unwrap_or(request.stress_unit);
    let stress_range = request.stress_unit.convert(request.stress_range, paris_unit);
    if paris_unit != request.stress_unit {
        info!(
            "stress_range {} {} converted to {} {} to match the Paris coefficient",
            request.stress_range, request.stress_unit, stress_range, paris_unit
        );
    }
    let cycles = fatigue::predict_cycles(
        request.c,
        request.m,
        stress_range,
        request.a_initial,
        request.a_final,
        request.geometry_factor,
    )?;
    Ok(FatigueResponse { cycles })
}

pub fn calculate_j_integral(request: &JIntegralRequest) -> Result<JIntegralResponse, ApiError> {
    let j = epfm::j_integral(
        request.k_i,
        request.youngs_modulus,
        request.poisson_ratio,
        Constraint::from_plane_stress(request.plane_stress),
    )?;
    Ok(JIntegralResponse { j_integral: j, unit: "J/m^2" })
}

fn instability<R: ResistanceCurve>(curve: R, request: &RCurveRequest) -> Result<Stability, FractureError> {
    InstabilityAnalyzer::new(curve)
        .with_options(request.sweep)
        .analyze(request.initial_crack, request.youngs_modulus, request.geometry_factor)
}

pub fn calculate_r_curve(request: &RCurveRequest) -> Result<RCurveResponse, ApiError> {
    let outcome = match &request.resistance {
        Some(expression) => instability(ExpressionCurve::new(expression, &request.parameters)?, request)?,
        None => instability(PowerLawCurve::demo(), request)?,
    };
    Ok(match outcome {
        Stability::Unstable(result) => RCurveResponse::Unstable {
            critical_stress: result.sigma_critical,
            critical_extension: result.delta_a_critical,
            unit_stress: "Pa",
            unit_extension: "m",
        },
        Stability::Stable => RCurveResponse::Stable {
            message: "Stable tearing (no instability found).",
        },
    })
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

fn respond<T: Serialize>(response: T) -> Result<Value, ApiError> {
    serde_json::to_value(response).map_err(|e| ApiError { status: 500, detail: e.to_string() })
}

/// Dispatches one request to its route.
pub fn handle(route: &str, body: &str) -> Result<Value, ApiError> {
    info!("request {}", route);
    let result = match route {
        "/" => Ok(json!({ "message": "Griffith Fracture Mechanics Tool" })),
        "/calculate-sif" => respond(calculate_sif(&parse(body)?)?),
        "/calculate-fatigue" => respond(calculate_fatigue(&parse(body)?)?),
        "/calculate-j-integral" => respond(calculate_j_integral(&parse(body)?)?),
        "/calculate-r-curve" => respond(calculate_r_curve(&parse(body)?)?),
        other => Err(ApiError::not_found(other)),
    };
    if let Err(err) = &result {
        warn!("request {} failed: {}", route, err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fatigue_unit_conversion_is_explicit() {
        let base = FatigueRequest {
            c: 1.5e-11,
            m: 3.0,
            stress_range: 150.0,
            a_initial: 0.002,
            a_final: 0.020,
            geometry_factor: 1.12,
            stress_unit: StressUnit::MPa,
            paris_unit: None,
        };
        let in_mpa = calculate_fatigue(&base).unwrap().cycles;

        let in_pa = FatigueRequest {
            stress_range: 150e6,
            stress_unit: StressUnit::Pa,
            paris_unit: Some(StressUnit::MPa),
            ..base.clone()
        };
        assert_relative_eq!(calculate_fatigue(&in_pa).unwrap().cycles, in_mpa, max_relative = 1e-12);

        // Pa stress with a Pa-calibrated coefficient is taken literally.
        let literal = FatigueRequest { stress_range: 150e6, stress_unit: StressUnit::Pa, ..base };
        let cycles = calculate_fatigue(&literal).unwrap().cycles;
        assert_relative_eq!(cycles * 1e18, in_mpa, max_relative = 1e-6);
    }

    #[test]
    fn test_error_status() {
        let err: ApiError = FractureError::InvalidDomain("x".into()).into();
        assert_eq!(err.status, 400);
        let err: ApiError = FractureError::NonConvergence { estimate: 1.0, error: 1.0, intervals: 200 }.into();
        assert_eq!(err.status, 422);
        assert_eq!(ApiError::not_found("/nope").status, 404);
        assert_eq!(ApiError::bad_request("bad").to_json(), json!({ "detail": "bad" }));
    }

    #[test]
    fn test_r_curve_with_expression() {
        let request = RCurveRequest {
            initial_crack: 0.05,
            youngs_modulus: 200e9,
            geometry_factor: 1.0,
            resistance: Some("1000 + 1000000 * da".into()),
            parameters: HashMap::new(),
            sweep: SweepOptions::default(),
        };
        assert_eq!(
            calculate_r_curve(&request).unwrap(),
            RCurveResponse::Stable { message: "Stable tearing (no instability found)." }
        );

        let broken = RCurveRequest { resistance: Some("j0 * da".into()), ..request };
        assert_eq!(calculate_r_curve(&broken).unwrap_err().status, 400);
    }
}
