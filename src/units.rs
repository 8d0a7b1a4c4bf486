//! Explicit stress units for the request layer.
//!
//! The numerical core works in whatever single unit system it is handed. Requests state
//! their units and are converted here; values are never reinterpreted from their
//! magnitude.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StressUnit {
    #[default]
    Pa,
    MPa,
}

impl StressUnit {
    /// Size of one unit in Pa.
    pub fn in_pascal(&self) -> f64 {
        match self {
            StressUnit::Pa => 1.0,
            StressUnit::MPa => 1e6,
        }
    }

    /// Re-expresses `value`, given in `self`, in `target` units.
    pub fn convert(&self, value: f64, target: StressUnit) -> f64 {
        value * self.in_pascal() / target.in_pascal()
    }
}

impl fmt::Display for StressUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert() {
        assert_eq!(StressUnit::Pa.convert(150e6, StressUnit::MPa), 150.0);
        assert_eq!(StressUnit::MPa.convert(150.0, StressUnit::Pa), 150e6);
        assert_eq!(StressUnit::MPa.convert(150.0, StressUnit::MPa), 150.0);
    }

    #[test]
    fn test_deserialize_exact_names_only() {
        assert_eq!(serde_json::from_str::<StressUnit>(r#""MPa""#).unwrap(), StressUnit::MPa);
        assert_eq!(serde_json::from_str::<StressUnit>(r#""Pa""#).unwrap(), StressUnit::Pa);
        assert!(serde_json::from_str::<StressUnit>(r#"" Pa ""#).is_err());
        assert!(serde_json::from_str::<StressUnit>(r#""mpa""#).is_err());
        assert!(serde_json::from_str::<StressUnit>(r#""ksi""#).is_err());
        assert_eq!(StressUnit::MPa.to_string(), "MPa");
    }
}
