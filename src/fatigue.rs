//! Fatigue crack growth under constant-amplitude loading.
//!
//! The Paris law `da/dN = c·ΔK^m` is integrated over crack length with
//! `ΔK(a) = Y·ΔS·sqrt(π·a)` to obtain the number of cycles needed to grow a crack
//! between two lengths. All inputs must share one consistent unit system: `c` has to be
//! calibrated for ΔK in the same stress unit as `stress_range`.

use std::f64::consts::PI;

use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, FractureError, Result};
use crate::quadrature::{integrate, Tolerance};

/// Paris-law coefficients of one material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParisLaw {
    /// Coefficient `c`, strictly positive.
    pub c: f64,
    /// Exponent `m`, typically between 2 and 6.
    pub m: f64,
}

impl ParisLaw {
    pub fn new(c: f64, m: f64) -> Result<Self> {
        require_positive("c", c)?;
        if !m.is_finite() {
            return Err(FractureError::domain(format!("m must be a finite number, got {}", m)));
        }
        Ok(ParisLaw { c, m })
    }

    /// Crack growth rate `da/dN` for a stress intensity range.
    pub fn growth_rate(&self, delta_k: f64) -> f64 {
        self.c * delta_k.powf(self.m)
    }
}

/// Crack driving force `ΔK(a) = Y·ΔS·sqrt(π·a)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrivingForce {
    pub geometry_factor: f64,
    pub stress_range: f64,
}

impl DrivingForce {
    pub fn new(geometry_factor: f64, stress_range: f64) -> Result<Self> {
        require_positive("geometry_factor", geometry_factor)?;
        require_positive("stress_range", stress_range)?;
        Ok(DrivingForce { geometry_factor, stress_range })
    }

    pub fn delta_k(&self, crack_length: f64) -> f64 {
        self.geometry_factor * self.stress_range * (PI * crack_length).sqrt()
    }
}

/// One point of a crack growth curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub crack_length: f64,
    pub cycles: f64,
}

/// Integrates the Paris law between two crack lengths.
#[derive(Debug, Clone, Copy)]
pub struct FatigueIntegrator {
    pub law: ParisLaw,
    pub tolerance: Tolerance,
}

impl FatigueIntegrator {
    pub fn new(law: ParisLaw) -> Self {
        FatigueIntegrator { law, tolerance: Tolerance::default() }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cycles `N = ∫ da / (c·ΔK(a)^m)` to grow a crack from `a_initial` to `a_final`.
    ///
    /// `a_initial` must be strictly positive: the integrand diverges at the origin and
    /// such input is rejected instead of integrated.
    pub fn cycles(&self, force: &DrivingForce, a_initial: f64, a_final: f64) -> Result<f64> {
        validate_bounds(a_initial, a_final)?;
        let law = self.law;
        let q = integrate(
            |a| 1.0 / law.growth_rate(force.delta_k(a)),
            a_initial,
            a_final,
            &self.tolerance,
        )?;
        if !q.value.is_finite() || q.value <= 0.0 {
            return Err(FractureError::domain(format!(
                "cycle integral is not a positive finite number: {}",
                q.value
            )));
        }
        debug!(
            "paris integral c={} m={} over [{}, {}]: {} cycles (error {})",
            law.c, law.m, a_initial, a_final, q.value, q.error
        );
        Ok(q.value)
    }

    /// Crack length against accumulated cycles at `steps + 1` evenly spaced lengths.
    ///
    /// Every point is integrated from `a_initial` on its own, so the points are
    /// computed in parallel and the last one equals [`FatigueIntegrator::cycles`].
    pub fn growth_curve(
        &self,
        force: &DrivingForce,
        a_initial: f64,
        a_final: f64,
        steps: usize,
    ) -> Result<Vec<GrowthPoint>> {
        validate_bounds(a_initial, a_final)?;
        if steps == 0 {
            return Err(FractureError::domain("steps must be greater than 0, got 0"));
        }
        let increment = (a_final - a_initial) / steps as f64;
        (0..=steps)
            .into_par_iter()
            .map(|k| -> Result<GrowthPoint> {
                let crack_length = if k == steps { a_final } else { a_initial + k as f64 * increment };
                let cycles = if k == 0 { 0.0 } else { self.cycles(force, a_initial, crack_length)? };
                Ok(GrowthPoint { crack_length, cycles })
            })
            .collect()
    }
}

fn validate_bounds(a_initial: f64, a_final: f64) -> Result<()> {
    require_positive("a_initial", a_initial)?;
    require_positive("a_final", a_final)?;
    if a_final <= a_initial {
        return Err(FractureError::domain(format!(
            "a_final must be greater than a_initial, got a_initial={} a_final={}",
            a_initial, a_final
        )));
    }
    Ok(())
}

/// Cycles to grow a crack from `a_initial` to `a_final` under the Paris law.
pub fn predict_cycles(
    c: f64,
    m: f64,
    stress_range: f64,
    a_initial: f64,
    a_final: f64,
    geometry_factor: f64,
) -> Result<f64> {
    let law = ParisLaw::new(c, m)?;
    let force = DrivingForce::new(geometry_factor, stress_range)?;
    FatigueIntegrator::new(law).cycles(&force, a_initial, a_final)
}

/// Paris-law coefficients fitted to measured growth rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParisFit {
    pub law: ParisLaw,
    pub r_squared: f64,
}

/// Fits `ln(da/dN) = ln(c) + m·ln(ΔK)` by least squares.
///
/// `samples` are `(ΔK, da/dN)` pairs; every value must be strictly positive and at
/// least two distinct ΔK values are needed.
pub fn fit_paris_law(samples: &[(f64, f64)]) -> Result<ParisFit> {
    if samples.len() < 2 {
        return Err(FractureError::domain(format!(
            "at least 2 samples are needed to fit the Paris law, got {}",
            samples.len()
        )));
    }
    for &(delta_k, rate) in samples {
        require_positive("delta_k", delta_k)?;
        require_positive("da_dn", rate)?;
    }
    let first = samples[0].0;
    if samples.iter().all(|s| s.0 == first) {
        return Err(FractureError::domain("delta_k samples must not all be equal"));
    }

    let rows = samples.len();
    let x = DMatrix::from_fn(rows, 2, |i, j| if j == 0 { 1.0 } else { samples[i].0.ln() });
    let y = DVector::from_iterator(rows, samples.iter().map(|s| s.1.ln()));

    let svd = x.clone().svd(true, true);
    let solution = svd
        .solve(&y, 1e-12)
        .map_err(|e| FractureError::domain(format!("least squares solve failed: {}", e)))?;

    let fitted = &x * &solution;
    let ss_res = (&y - fitted).norm_squared();
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    let law = ParisLaw::new(solution[0].exp(), solution[1])?;
    info!("fitted paris law c={:e} m={} (r^2 {})", law.c, law.m, r_squared);
    Ok(ParisFit { law, r_squared })
}
