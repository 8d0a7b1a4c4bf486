//! A module for material constants used by the fracture calculations.

use anyhow::{anyhow, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Represents the fracture-relevant properties of one material.
///
/// All stresses are in Pa, `k_ic` in Pa·sqrt(m) and `j_ic` in J/m².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name of the material.
    pub name: String,
    /// Young's modulus of the material.
    pub youngs_modulus: f64,
    /// Poisson's ratio of the material.
    #[serde(default = "default_poissons_ratio")]
    pub poissons_ratio: f64,
    /// Yield strength of the material.
    pub yield_strength: f64,
    /// Plane strain fracture toughness, when known.
    #[serde(default)]
    pub k_ic: Option<f64>,
    /// Fracture toughness in energy units, when known.
    #[serde(default)]
    pub j_ic: Option<f64>,
}

fn default_poissons_ratio() -> f64 {
    0.3
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(anyhow!("{} must be greater than 0.0, got {}", name, value));
    }
    Ok(())
}

impl Material {
    pub fn steel() -> Self {
        Material {
            name: "Steel".into(),
            youngs_modulus: 200e9,
            poissons_ratio: 0.3,
            yield_strength: 350e6,
            k_ic: Some(50e6),
            j_ic: None,
        }
    }

    pub fn aluminum() -> Self {
        Material {
            name: "Aluminum 2024-T3".into(),
            youngs_modulus: 73e9,
            poissons_ratio: 0.33,
            yield_strength: 300e6,
            k_ic: Some(25e6),
            j_ic: None,
        }
    }

    pub fn titanium() -> Self {
        Material {
            name: "Titanium Ti-6Al-4V".into(),
            youngs_modulus: 113e9,
            poissons_ratio: 0.34,
            yield_strength: 830e6,
            k_ic: Some(55e6),
            j_ic: None,
        }
    }

    /// Replaces the fracture toughness, e.g. for a tougher steel grade.
    pub fn with_k_ic(mut self, k_ic: f64) -> Self {
        self.k_ic = Some(k_ic);
        self
    }

    /// Validates the `Material` struct to ensure all mechanical properties are defined correctly.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if all properties are valid and within their expected ranges.
    /// Otherwise, it returns an error detailing the issue.
    ///
    /// # Examples
    ///
    /// ```
    /// use griffith::material::Material;
    ///
    /// assert!(Material::steel().validate().is_ok());
    ///
    /// let mut soft = Material::aluminum();
    /// soft.youngs_modulus = -1.0;
    /// assert!(soft.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("name must not be empty, got {}", self.name));
        }
        positive("youngs_modulus", self.youngs_modulus)?;
        if !(0.0..0.5).contains(&self.poissons_ratio) {
            return Err(anyhow!("poissons_ratio must be between 0.0 and 0.5, got {}", self.poissons_ratio));
        }
        positive("yield_strength", self.yield_strength)?;
        if let Some(k_ic) = self.k_ic {
            positive("k_ic", k_ic)?;
        }
        if let Some(j_ic) = self.j_ic {
            positive("j_ic", j_ic)?;
        }
        Ok(())
    }

    /// Critical crack length under a remote stress, from `k_ic`.
    pub fn critical_crack_length(&self, stress: f64, geometry_factor: f64) -> Result<f64> {
        let k_ic = self
            .k_ic
            .ok_or_else(|| anyhow!("K_IC not defined for {}", self.name))?;
        Ok(geometry::critical_crack_length(k_ic, stress, geometry_factor)?)
    }
}

/// The fixed set of materials that can be referenced by name.
#[derive(Debug, Clone)]
pub struct Registry {
    materials: HashMap<String, Material>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut materials = HashMap::new();
        for (key, material) in [
            ("steel", Material::steel()),
            ("aluminum", Material::aluminum()),
            ("titanium", Material::titanium()),
        ] {
            materials.insert(key.to_string(), material);
        }
        Registry { materials }
    }
}

impl Registry {
    /// Case-insensitive lookup by short name.
    pub fn get(&self, name: &str) -> Result<&Material> {
        self.materials
            .get(&name.trim().to_ascii_lowercase())
            .ok_or_else(|| anyhow!("material must be Steel, Aluminum or Titanium, got {}", name))
    }

    /// Short names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_registry_lookup() {
        let registry = Registry::default();
        assert_eq!(registry.names(), vec!["aluminum", "steel", "titanium"]);
        assert_eq!(registry.get("Steel").unwrap().youngs_modulus, 200e9);
        assert_eq!(registry.get(" TITANIUM ").unwrap().k_ic, Some(55e6));
        assert_eq!(registry.get("aluminum").unwrap().name, "Aluminum 2024-T3");
        assert!(registry.get("copper").is_err());
        for name in registry.names() {
            assert!(registry.get(name).unwrap().validate().is_ok());
        }
    }

    #[test]
    fn test_leak_before_break() {
        // Vessel r = 1 m, t = 10 mm, p = 2 MPa -> hoop stress 200 MPa
        let hoop_stress = 2e6 * 1.0 / 0.01;
        let material = Material::steel().with_k_ic(80e6);
        let a_crit = material.critical_crack_length(hoop_stress, 1.0).unwrap();
        assert_relative_eq!(a_crit, 0.16 / std::f64::consts::PI, max_relative = 1e-12);
        assert!(a_crit > 0.01);
    }

    #[test]
    fn test_missing_toughness() {
        let mut material = Material::steel();
        material.k_ic = None;
        let err = material.critical_crack_length(200e6, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "K_IC not defined for Steel");
    }

    #[test]
    fn test_validate() {
        let mut material = Material::titanium();
        material.poissons_ratio = 0.6;
        assert!(material.validate().is_err());

        let mut material = Material::steel();
        material.k_ic = Some(-1.0);
        assert!(material.validate().is_err());

        let mut material = Material::steel();
        material.name = " ".into();
        assert!(material.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut material = Material::steel();
        material.youngs_modulus = f64::NAN;
        assert_eq!(material.validate().unwrap_err().to_string(), "youngs_modulus must be greater than 0.0, got NaN");

        let mut material = Material::aluminum();
        material.yield_strength = f64::INFINITY;
        assert!(material.validate().is_err());

        let mut material = Material::titanium();
        material.k_ic = Some(f64::NAN);
        assert!(material.validate().is_err());

        let mut material = Material::steel();
        material.j_ic = Some(f64::NAN);
        assert!(material.validate().is_err());
    }
}
