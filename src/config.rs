//! A module for loading and validating analysis job files.
//!
//! A job file is YAML (or TOML, chosen by the `.toml` extension) with optional `fatigue`
//! and `r_curve` sections, an optional registry `material` and an `output` section.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::material::{Material, Registry};
use crate::r_curve::SweepOptions;
use crate::units::StressUnit;

/// Represents an error that can occur during validation of configuration data.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a given message.
    pub fn new(message: &str) -> ValidationError {
        ValidationError {
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

fn positive(name: &str, value: f64) -> std::result::Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(&format!("{} must be greater than 0.0, got {}", name, value)));
    }
    Ok(())
}

/// Represents one analysis job.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Registry material supplying defaults such as Young's modulus.
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub fatigue: Option<FatigueJob>,
    #[serde(default)]
    pub r_curve: Option<RCurveJob>,
    #[serde(default)]
    pub output: Output,
}

impl Config {
    /// Validates the entire configuration.
    ///
    /// Checks every present section and that at least one analysis is requested.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.fatigue.is_none() && self.r_curve.is_none() {
            return Err(ValidationError::new("at least one of fatigue or r_curve must be given"));
        }
        if let Some(name) = &self.material {
            Registry::default()
                .get(name)
                .map_err(|e| ValidationError::new(&e.to_string()))?;
        }
        if let Some(fatigue) = &self.fatigue {
            fatigue.validate()?;
        }
        if let Some(r_curve) = &self.r_curve {
            r_curve.validate()?;
        }
        self.output.validate()?;
        Ok(())
    }

    /// The registry material named by the job, if any.
    pub fn material(&self) -> Result<Option<Material>> {
        match &self.material {
            Some(name) => Ok(Some(Registry::default().get(name)?.clone())),
            None => Ok(None),
        }
    }
}

fn default_geometry_factor() -> f64 {
    1.0
}

fn default_curve_steps() -> usize {
    50
}

fn default_diagram_points() -> usize {
    100
}

/// Represents a Paris-law fatigue life calculation.
#[derive(Debug, Clone, Deserialize)]
pub struct FatigueJob {
    /// Paris coefficient, calibrated for ΔK in `paris_unit`·sqrt(m).
    pub c: f64,
    /// Paris exponent.
    pub m: f64,
    /// Constant-amplitude stress range, in `stress_unit`.
    pub stress_range: f64,
    #[serde(default)]
    pub stress_unit: StressUnit,
    /// Defaults to `stress_unit`.
    #[serde(default)]
    pub paris_unit: Option<StressUnit>,
    /// Initial crack length in m.
    pub a_initial: f64,
    /// Final crack length in m.
    pub a_final: f64,
    #[serde(default = "default_geometry_factor")]
    pub geometry_factor: f64,
    /// Number of intervals in the reported growth curve.
    #[serde(default = "default_curve_steps")]
    pub curve_steps: usize,
}

impl FatigueJob {
    /// Validates the fatigue section.
    ///
    /// # Examples
    ///
    /// ```
    /// use griffith::config::FatigueJob;
    /// use griffith::units::StressUnit;
    ///
    /// let job = FatigueJob {
    ///     c: 1.5e-11,
    ///     m: 3.0,
    ///     stress_range: 150.0,
    ///     stress_unit: StressUnit::MPa,
    ///     paris_unit: None,
    ///     a_initial: 0.002,
    ///     a_final: 0.020,
    ///     geometry_factor: 1.12,
    ///     curve_steps: 50,
    /// };
    /// assert!(job.validate().is_ok());
    ///
    /// let reversed = FatigueJob { a_initial: 0.03, ..job };
    /// assert!(reversed.validate().is_err());
    /// ```
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        positive("c", self.c)?;
        if !self.m.is_finite() {
            return Err(ValidationError::new(&format!("m must be a finite number, got {}", self.m)));
        }
        positive("stress_range", self.stress_range)?;
        positive("a_initial", self.a_initial)?;
        positive("a_final", self.a_final)?;
        if self.a_final <= self.a_initial {
            return Err(ValidationError::new(&format!(
                "a_final must be greater than a_initial, got a_initial={} a_final={}",
                self.a_initial, self.a_final
            )));
        }
        positive("geometry_factor", self.geometry_factor)?;
        if self.curve_steps == 0 {
            return Err(ValidationError::new("curve_steps must be greater than 0, got 0"));
        }
        Ok(())
    }

    /// Stress range expressed in the unit the Paris coefficient was calibrated in.
    pub fn stress_range_for_paris(&self) -> f64 {
        let target = self.paris_unit.unwrap_or(self.stress_unit);
        self.stress_unit.convert(self.stress_range, target)
    }
}

/// Represents an R-curve instability search. All quantities are SI (m, Pa, J/m²).
#[derive(Debug, Clone, Deserialize)]
pub struct RCurveJob {
    pub initial_crack: f64,
    /// Falls back to the job material, then to 200 GPa.
    #[serde(default)]
    pub youngs_modulus: Option<f64>,
    #[serde(default = "default_geometry_factor")]
    pub geometry_factor: f64,
    /// Resistance expression in `da`; the demo power-law curve when absent.
    #[serde(default)]
    pub resistance: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, f64>,
    #[serde(default)]
    pub sweep: SweepOptions,
    /// Rows in the exported stability diagram.
    #[serde(default = "default_diagram_points")]
    pub diagram_points: usize,
}

impl RCurveJob {
    /// Validates the R-curve section, including its sweep settings.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        positive("initial_crack", self.initial_crack)?;
        if let Some(e) = self.youngs_modulus {
            positive("youngs_modulus", e)?;
        }
        positive("geometry_factor", self.geometry_factor)?;
        if let Some(expression) = &self.resistance {
            if expression.trim().is_empty() {
                return Err(ValidationError::new("resistance must not be empty"));
            }
        }
        self.sweep
            .validate()
            .map_err(|e| ValidationError::new(&format!("sweep: {}", e)))?;
        if self.diagram_points < 2 {
            return Err(ValidationError::new(&format!(
                "diagram_points must be at least 2, got {}",
                self.diagram_points
            )));
        }
        Ok(())
    }
}

/// Where reports are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Output {
    /// Directory for CSV reports; nothing is written when absent.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Output {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if let Some(directory) = &self.directory {
            if directory.trim().is_empty() {
                return Err(ValidationError::new("output directory must not be empty"));
            }
        }
        Ok(())
    }
}

/// Loads the configuration from a YAML or TOML file.
///
/// # Arguments
///
/// * `config_path` - A path reference to the configuration file.
///
/// # Errors
///
/// This function will return an error if reading or parsing the configuration file fails.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config> {
    let path = config_path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let config: Config = if is_toml {
        toml::from_str(&content).with_context(|| format!("Failed to parse TOML {}", path.display()))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML {}", path.display()))?
    };
    Ok(config)
}
