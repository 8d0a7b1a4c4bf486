//! Elastic-plastic conversions from the stress intensity factor.

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, FractureError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    PlaneStress,
    PlaneStrain,
}

impl Constraint {
    pub fn from_plane_stress(plane_stress: bool) -> Self {
        if plane_stress {
            Constraint::PlaneStress
        } else {
            Constraint::PlaneStrain
        }
    }

    /// `E' = E` in plane stress, `E / (1 - ν²)` in plane strain.
    pub fn effective_modulus(&self, youngs_modulus: f64, poisson_ratio: f64) -> f64 {
        match self {
            Constraint::PlaneStress => youngs_modulus,
            Constraint::PlaneStrain => youngs_modulus / (1.0 - poisson_ratio.powi(2)),
        }
    }
}

/// J-integral `J = K_I² / E'` in J/m².
pub fn j_integral(k_i: f64, youngs_modulus: f64, poisson_ratio: f64, constraint: Constraint) -> Result<f64> {
    require_positive("youngs_modulus", youngs_modulus)?;
    if !(0.0..0.5).contains(&poisson_ratio) {
        return Err(FractureError::domain(format!(
            "poisson_ratio must be between 0.0 and 0.5, got {}",
            poisson_ratio
        )));
    }
    Ok(k_i.powi(2) / constraint.effective_modulus(youngs_modulus, poisson_ratio))
}

/// Crack tip opening displacement `δ = K_I² / (m·σ_y·E)` in m.
pub fn ctod(k_i: f64, yield_strength: f64, youngs_modulus: f64, constraint_factor: f64) -> Result<f64> {
    require_positive("yield_strength", yield_strength)?;
    require_positive("youngs_modulus", youngs_modulus)?;
    require_positive("constraint_factor", constraint_factor)?;
    Ok(k_i.powi(2) / (constraint_factor * yield_strength * youngs_modulus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_j_integral() {
        let plane_stress = j_integral(50e6, 200e9, 0.3, Constraint::PlaneStress).unwrap();
        assert_relative_eq!(plane_stress, 12_500.0, max_relative = 1e-12);

        let plane_strain = j_integral(50e6, 200e9, 0.3, Constraint::from_plane_stress(false)).unwrap();
        assert_relative_eq!(plane_strain, 12_500.0 * 0.91, max_relative = 1e-12);

        assert!(j_integral(50e6, 0.0, 0.3, Constraint::PlaneStress).is_err());
        assert!(j_integral(50e6, 200e9, 0.5, Constraint::PlaneStrain).is_err());
    }

    #[test]
    fn test_ctod() {
        let delta = ctod(50e6, 350e6, 200e9, 1.0).unwrap();
        assert_relative_eq!(delta, 2.5e15 / 7e19, max_relative = 1e-12);
        assert!(ctod(50e6, 350e6, 200e9, 0.0).is_err());
    }
}
