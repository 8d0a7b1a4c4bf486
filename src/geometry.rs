//! Mode I stress intensity factors for a closed set of crack geometries.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, FractureError, Result};

/// Crack geometry with its per-variant `K_I` formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    /// `K = Y·σ·sqrt(π·a)` with a constant geometry factor.
    InfinitePlate { geometry_factor: f64 },
    /// Centre crack of total length `2a` in a plate of width `W`
    /// (Tada/Paris/Irwin secant correction).
    CenterCrackedPlate { width: f64 },
    /// Single edge notch bend specimen (ASTM E399), loaded by a force.
    SingleEdgeNotchBend { width: f64, thickness: f64, span: f64 },
}

impl Geometry {
    /// Looks up a geometry by its short request-layer name.
    ///
    /// `INFINITE` uses `Y = 1`; the SENB specimen needs its dimensions and is built
    /// directly instead.
    pub fn from_name(name: &str, width: f64) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "CCT" => Ok(Geometry::CenterCrackedPlate { width }),
            "INFINITE" => Ok(Geometry::InfinitePlate { geometry_factor: 1.0 }),
            other => Err(FractureError::Unsupported(format!("Geometry not supported: {}", other))),
        }
    }

    /// Geometry factor `Y` for a crack length.
    ///
    /// For the centre-cracked plate `crack_length` is the total length `2a`.
    pub fn geometry_factor(&self, crack_length: f64) -> Result<f64> {
        require_positive("crack_length", crack_length)?;
        match *self {
            Geometry::InfinitePlate { geometry_factor } => {
                require_positive("geometry_factor", geometry_factor)?;
                Ok(geometry_factor)
            }
            Geometry::CenterCrackedPlate { width } => {
                require_positive("width", width)?;
                let alpha = crack_length / width;
                if alpha >= 1.0 {
                    return Err(FractureError::domain(format!(
                        "crack length {} must be smaller than the plate width {}",
                        crack_length, width
                    )));
                }
                Ok((1.0 / (PI * alpha / 2.0).cos()).sqrt())
            }
            Geometry::SingleEdgeNotchBend { width, .. } => {
                require_positive("width", width)?;
                senb_shape_factor(crack_length / width)
            }
        }
    }

    /// `K_I` under a remote stress.
    pub fn k1(&self, stress: f64, crack_length: f64) -> Result<f64> {
        match *self {
            Geometry::InfinitePlate { .. } => {
                let y = self.geometry_factor(crack_length)?;
                Ok(y * stress * (PI * crack_length).sqrt())
            }
            Geometry::CenterCrackedPlate { .. } => {
                let y = self.geometry_factor(crack_length)?;
                let a = crack_length / 2.0;
                Ok(y * stress * (PI * a).sqrt())
            }
            Geometry::SingleEdgeNotchBend { .. } => Err(FractureError::Unsupported(
                "remote stress K_I is not defined for SENB, use k1_from_load".into(),
            )),
        }
    }

    /// `K_I = P·S / (B·W^1.5) · f(a/W)` for the SENB specimen.
    pub fn k1_from_load(&self, load: f64, crack_length: f64) -> Result<f64> {
        match *self {
            Geometry::SingleEdgeNotchBend { width, thickness, span } => {
                require_positive("thickness", thickness)?;
                require_positive("span", span)?;
                let f = self.geometry_factor(crack_length)?;
                Ok(load * span / (thickness * width.powf(1.5)) * f)
            }
            _ => Err(FractureError::Unsupported(
                "load based K_I is only defined for SENB".into(),
            )),
        }
    }
}

fn senb_shape_factor(alpha: f64) -> Result<f64> {
    if alpha >= 1.0 {
        return Err(FractureError::domain(format!(
            "a/W must be smaller than 1.0, got {}",
            alpha
        )));
    }
    let numerator =
        3.0 * alpha.sqrt() * (1.99 - alpha * (1.0 - alpha) * (2.15 - 3.93 * alpha + 2.7 * alpha.powi(2)));
    let denominator = 2.0 * (1.0 + 2.0 * alpha) * (1.0 - alpha).powf(1.5);
    Ok(numerator / denominator)
}

/// Critical crack length `a_c = (1/π)·(K_IC / (Y·σ))²`.
pub fn critical_crack_length(k_ic: f64, stress: f64, geometry_factor: f64) -> Result<f64> {
    require_positive("k_ic", k_ic)?;
    require_positive("stress", stress)?;
    require_positive("geometry_factor", geometry_factor)?;
    Ok((1.0 / PI) * (k_ic / (geometry_factor * stress)).powi(2))
}
