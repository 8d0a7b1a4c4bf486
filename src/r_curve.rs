//! R-curve stability analysis.
//!
//! With the driving force `J(Δa) = (Y·σ)²·π·(a0+Δa)/E`, fracture becomes unstable where
//! the applied curve both meets and is tangent to the resistance curve: `J = R` and
//! `dJ/dΔa = dR/dΔa`. Eliminating `(Y·σ)²` leaves one equation in Δa alone,
//!
//! ```text
//! (a0 + Δa)·R'(Δa) = R(Δa)
//! ```
//!
//! which is located by a uniform sweep, after which `σ_c` follows in closed form.
//!
//! Accuracy limits: `R'` is a central difference with step `ε`, so it carries an
//! O(ε²) truncation error; without refinement the critical extension is only resolved
//! to one sweep step `(upper - lower)/(samples - 1)`.

use std::f64::consts::PI;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, FractureError, Result};

/// Material resistance `R(Δa)` in J/m² as a function of crack extension in m.
pub trait ResistanceCurve {
    fn resistance(&self, delta_a: f64) -> f64;

    /// [`ResistanceCurve::resistance`], rejected unless finite. Curves that can fail
    /// for a reason of their own override this to report it.
    fn checked_resistance(&self, delta_a: f64) -> Result<f64> {
        let r = self.resistance(delta_a);
        if !r.is_finite() {
            return Err(FractureError::domain(format!(
                "resistance is not finite at delta_a={}: {}",
                delta_a, r
            )));
        }
        Ok(r)
    }
}

impl<F> ResistanceCurve for F
where
    F: Fn(f64) -> f64,
{
    fn resistance(&self, delta_a: f64) -> f64 {
        self(delta_a)
    }
}

/// `R(Δa) = r0 + coefficient·Δa^exponent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLawCurve {
    pub r0: f64,
    pub coefficient: f64,
    pub exponent: f64,
}

impl PowerLawCurve {
    /// `(150 + 400·sqrt(Δa))` kJ/m², expressed in J/m².
    pub fn demo() -> Self {
        PowerLawCurve { r0: 150e3, coefficient: 400e3, exponent: 0.5 }
    }
}

impl ResistanceCurve for PowerLawCurve {
    fn resistance(&self, delta_a: f64) -> f64 {
        self.r0 + self.coefficient * delta_a.powf(self.exponent)
    }
}

/// Upper bound on [`SweepOptions::samples`], keeping one analysis at a few million
/// resistance evaluations.
pub const MAX_SAMPLES: usize = 100_000;

/// Sweep over crack extension used to bracket the tangency point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    /// First sampled extension (m), must exceed `epsilon`.
    pub lower: f64,
    /// Last sampled extension (m).
    pub upper: f64,
    pub samples: usize,
    /// Finite-difference step (m).
    pub epsilon: f64,
    /// Bisect inside the bracketing interval instead of reporting the sample before
    /// the sign change.
    pub refine: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            lower: 1e-5,
            upper: 0.1,
            samples: 1000,
            epsilon: 1e-6,
            refine: false,
        }
    }
}

impl SweepOptions {
    pub fn validate(&self) -> Result<()> {
        require_positive("epsilon", self.epsilon)?;
        require_positive("upper", self.upper)?;
        if !(self.lower > self.epsilon) {
            return Err(FractureError::domain(format!(
                "lower must be greater than epsilon ({}), got {}",
                self.epsilon, self.lower
            )));
        }
        if self.upper <= self.lower {
            return Err(FractureError::domain(format!(
                "upper must be greater than lower ({}), got {}",
                self.lower, self.upper
            )));
        }
        if !(2..=MAX_SAMPLES).contains(&self.samples) {
            return Err(FractureError::domain(format!(
                "samples must be between 2 and {}, got {}",
                MAX_SAMPLES, self.samples
            )));
        }
        Ok(())
    }

    fn sample(&self, i: usize) -> f64 {
        if i + 1 == self.samples {
            self.upper
        } else {
            self.lower + (self.upper - self.lower) * i as f64 / (self.samples - 1) as f64
        }
    }
}

/// Onset of unstable crack growth, with the inputs needed to redraw the driving force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstabilityResult {
    pub delta_a_critical: f64,
    pub a_critical: f64,
    pub r_critical: f64,
    pub sigma_critical: f64,
    pub initial_crack: f64,
    pub youngs_modulus: f64,
    pub geometry_factor: f64,
}

impl InstabilityResult {
    /// Applied `J` at the critical stress for a given crack extension.
    pub fn applied_driving_force(&self, delta_a: f64) -> f64 {
        (self.geometry_factor * self.sigma_critical).powi(2) * PI * (self.initial_crack + delta_a)
            / self.youngs_modulus
    }
}

/// Outcome of an instability search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Stability {
    Unstable(InstabilityResult),
    /// No tangency inside the swept range: the crack tears stably.
    Stable,
}

impl Stability {
    pub fn critical(&self) -> Option<&InstabilityResult> {
        match self {
            Stability::Unstable(result) => Some(result),
            Stability::Stable => None,
        }
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Locates the tangency between the applied driving force and a resistance curve.
#[derive(Debug, Clone)]
pub struct InstabilityAnalyzer<R> {
    curve: R,
    options: SweepOptions,
}

impl<R: ResistanceCurve> InstabilityAnalyzer<R> {
    pub fn new(curve: R) -> Self {
        InstabilityAnalyzer { curve, options: SweepOptions::default() }
    }

    pub fn with_options(mut self, options: SweepOptions) -> Self {
        self.options = options;
        self
    }

    pub fn curve(&self) -> &R {
        &self.curve
    }

    fn evaluate(&self, delta_a: f64) -> Result<f64> {
        self.curve.checked_resistance(delta_a)
    }

    /// `(a0+Δa)·R'(Δa) − R(Δa)` together with `R(Δa)`.
    fn tangency_residual(&self, initial_crack: f64, delta_a: f64) -> Result<(f64, f64)> {
        let eps = self.options.epsilon;
        let r = self.evaluate(delta_a)?;
        let slope = (self.evaluate(delta_a + eps)? - self.evaluate(delta_a - eps)?) / (2.0 * eps);
        Ok(((initial_crack + delta_a) * slope - r, r))
    }

    fn bisect(&self, initial_crack: f64, mut low: f64, mut high: f64, mut f_low: f64) -> Result<f64> {
        for _ in 0..60 {
            let mid = 0.5 * (low + high);
            let (f_mid, _) = self.tangency_residual(initial_crack, mid)?;
            if f_mid == 0.0 {
                return Ok(mid);
            }
            if sign(f_mid) == sign(f_low) {
                low = mid;
                f_low = f_mid;
            } else {
                high = mid;
            }
        }
        Ok(0.5 * (low + high))
    }

    /// Sweeps the crack extension and reports the first tangency point.
    pub fn analyze(&self, initial_crack: f64, youngs_modulus: f64, geometry_factor: f64) -> Result<Stability> {
        require_positive("initial_crack", initial_crack)?;
        require_positive("youngs_modulus", youngs_modulus)?;
        require_positive("geometry_factor", geometry_factor)?;
        self.options.validate()?;

        let opts = &self.options;
        let mut previous: Option<(f64, f64, f64)> = None;
        let mut bracket = None;
        for i in 0..opts.samples {
            let delta_a = opts.sample(i);
            let (diff, r) = self.tangency_residual(initial_crack, delta_a)?;
            if let Some((prev_delta_a, prev_diff, prev_r)) = previous {
                if sign(prev_diff) != sign(diff) {
                    bracket = Some((prev_delta_a, prev_diff, prev_r, delta_a));
                    break;
                }
            }
            previous = Some((delta_a, diff, r));
        }

        let (delta_a_critical, r_critical) = match bracket {
            None => {
                info!(
                    "no instability for a0={} over delta_a in [{}, {}]: stable tearing",
                    initial_crack, opts.lower, opts.upper
                );
                return Ok(Stability::Stable);
            }
            Some((low, f_low, r_low, high)) => {
                debug!("tangency bracketed in [{}, {}]", low, high);
                if opts.refine && f_low != 0.0 {
                    let root = self.bisect(initial_crack, low, high, f_low)?;
                    (root, self.evaluate(root)?)
                } else {
                    (low, r_low)
                }
            }
        };

        let a_critical = initial_crack + delta_a_critical;
        let sigma_critical =
            (r_critical * youngs_modulus / (geometry_factor.powi(2) * PI * a_critical)).sqrt();
        info!(
            "instability at delta_a={} (a={}), R={} J/m^2, sigma_c={} Pa",
            delta_a_critical, a_critical, r_critical, sigma_critical
        );

        Ok(Stability::Unstable(InstabilityResult {
            delta_a_critical,
            a_critical,
            r_critical,
            sigma_critical,
            initial_crack,
            youngs_modulus,
            geometry_factor,
        }))
    }
}

/// Critical stress and critical extension, or `(None, None)` for stable tearing.
pub fn find_instability_load<R: ResistanceCurve>(
    resistance: R,
    initial_crack: f64,
    youngs_modulus: f64,
    geometry_factor: f64,
) -> Result<(Option<f64>, Option<f64>)> {
    let outcome = InstabilityAnalyzer::new(resistance).analyze(initial_crack, youngs_modulus, geometry_factor)?;
    Ok(match outcome.critical() {
        Some(result) => (Some(result.sigma_critical), Some(result.delta_a_critical)),
        None => (None, None),
    })
}

/// One row of a stability diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiagramPoint {
    pub delta_a: f64,
    pub resistance: f64,
    pub applied: f64,
}

/// Resistance and applied driving force at the critical stress over
/// `Δa ∈ [0, 2·delta_a_critical]`.
pub fn stability_diagram<R>(curve: &R, result: &InstabilityResult, points: usize) -> Vec<DiagramPoint>
where
    R: ResistanceCurve + ?Sized,
{
    let points = points.max(2);
    let span = 2.0 * result.delta_a_critical;
    (0..points)
        .map(|i| {
            let delta_a = span * i as f64 / (points - 1) as f64;
            DiagramPoint {
                delta_a,
                resistance: curve.resistance(delta_a),
                applied: result.applied_driving_force(delta_a),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // 20 s^2 + 15 s - 1 = 0 with s = sqrt(delta_a) for the demo curve at a0 = 0.05
    fn demo_root() -> f64 {
        let s = (-15.0 + 305f64.sqrt()) / 40.0;
        s * s
    }

    #[test]
    fn test_demo_curve_instability() {
        let outcome = InstabilityAnalyzer::new(PowerLawCurve::demo())
            .analyze(0.05, 200e9, 1.0)
            .unwrap();
        let result = outcome.critical().expect("demo curve must become unstable");

        let step = (0.1 - 1e-5) / 999.0;
        assert!(result.delta_a_critical <= demo_root());
        assert!(result.delta_a_critical > demo_root() - step);
        assert_relative_eq!(result.a_critical, 0.05 + result.delta_a_critical);
        assert!(result.sigma_critical > 100e6 && result.sigma_critical < 1000e6);
        assert!((result.sigma_critical - 455e6).abs() < 5e6, "sigma_c = {}", result.sigma_critical);
        assert_relative_eq!(
            result.r_critical,
            PowerLawCurve::demo().resistance(result.delta_a_critical),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_find_instability_load_with_closure() {
        let (stress, extension) =
            find_instability_load(|da: f64| (150.0 + 400.0 * da.sqrt()) * 1000.0, 0.05, 200e9, 1.0).unwrap();
        let stress = stress.unwrap();
        let extension = extension.unwrap();
        assert!(stress > 0.0);
        assert!(extension > 0.0 && extension < 0.1);
    }

    #[test]
    fn test_concave_curve_finds_tangency() {
        let curve = PowerLawCurve { r0: 100e3, coefficient: 300e3, exponent: 0.3 };
        let outcome = InstabilityAnalyzer::new(curve).analyze(0.02, 70e9, 1.12).unwrap();
        let result = outcome.critical().unwrap();
        assert!(result.sigma_critical > 0.0);
        assert!(result.delta_a_critical > 0.0 && result.delta_a_critical <= 0.1);
    }

    #[test]
    fn test_linear_curve_is_stable() {
        // (a0 + da)·k - (r0 + k·da) = a0·k - r0 > 0 everywhere
        let (stress, extension) = find_instability_load(|da: f64| 1000.0 + 1e6 * da, 0.01, 200e9, 1.0).unwrap();
        assert_eq!(stress, None);
        assert_eq!(extension, None);

        let outcome = InstabilityAnalyzer::new(|da: f64| 1000.0 + 1e6 * da)
            .analyze(0.01, 200e9, 1.0)
            .unwrap();
        assert_eq!(outcome, Stability::Stable);
    }

    #[test]
    fn test_refinement_converges_to_root() {
        let options = SweepOptions { refine: true, ..SweepOptions::default() };
        let outcome = InstabilityAnalyzer::new(PowerLawCurve::demo())
            .with_options(options)
            .analyze(0.05, 200e9, 1.0)
            .unwrap();
        let result = outcome.critical().unwrap();
        assert_relative_eq!(result.delta_a_critical, demo_root(), max_relative = 1e-4);
    }

    #[test]
    fn test_coarse_sweep_is_resolution_limited() {
        let options = SweepOptions { samples: 11, ..SweepOptions::default() };
        let outcome = InstabilityAnalyzer::new(PowerLawCurve::demo())
            .with_options(options)
            .analyze(0.05, 200e9, 1.0)
            .unwrap();
        // the first sample is the last one before the sign change
        assert_eq!(outcome.critical().unwrap().delta_a_critical, 1e-5);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let analyzer = InstabilityAnalyzer::new(PowerLawCurve::demo());
        assert!(matches!(analyzer.analyze(0.0, 200e9, 1.0), Err(FractureError::InvalidDomain(_))));
        assert!(matches!(analyzer.analyze(0.05, -1.0, 1.0), Err(FractureError::InvalidDomain(_))));
        assert!(matches!(analyzer.analyze(0.05, 200e9, 0.0), Err(FractureError::InvalidDomain(_))));

        let options = SweepOptions { lower: 1e-7, ..SweepOptions::default() };
        let err = InstabilityAnalyzer::new(PowerLawCurve::demo())
            .with_options(options)
            .analyze(0.05, 200e9, 1.0)
            .unwrap_err();
        assert!(matches!(err, FractureError::InvalidDomain(_)));

        let options = SweepOptions { samples: 1, ..SweepOptions::default() };
        assert!(options.validate().is_err());
        let options = SweepOptions { upper: 1e-6, ..SweepOptions::default() };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_sweep_size_is_bounded() {
        let options = SweepOptions { samples: MAX_SAMPLES, ..SweepOptions::default() };
        assert!(options.validate().is_ok());

        for samples in [MAX_SAMPLES + 1, usize::MAX] {
            let options = SweepOptions { samples, ..SweepOptions::default() };
            let err = InstabilityAnalyzer::new(|da: f64| 1e3 + 1e6 * da)
                .with_options(options)
                .analyze(0.01, 200e9, 1.0)
                .unwrap_err();
            assert!(matches!(err, FractureError::InvalidDomain(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_exact_zero_residual_counts_as_sign_change() {
        assert_eq!(sign(0.0), 0);
        assert_eq!(sign(-0.0), 0);
        assert_eq!(sign(-1e-300), -1);

        // Flat at 100 J/m^2 around 10 mm, flat at zero around 20 mm: the residual is -100
        // and then exactly 0.
        let curve = |da: f64| if da < 0.015 { 100.0 } else { 0.0 };
        let options = SweepOptions { lower: 0.01, upper: 0.03, samples: 3, epsilon: 1e-3, refine: false };
        let outcome = InstabilityAnalyzer::new(curve)
            .with_options(options)
            .analyze(0.05, 200e9, 1.0)
            .unwrap();
        let result = outcome.critical().unwrap();
        assert_eq!(result.delta_a_critical, 0.01);
        assert_eq!(result.r_critical, 100.0);

        // A zero residual at the first sample is reported as that sample.
        let curve = |da: f64| if da < 0.015 { 0.0 } else { 100.0 };
        let outcome = InstabilityAnalyzer::new(curve)
            .with_options(options)
            .analyze(0.05, 200e9, 1.0)
            .unwrap();
        assert_eq!(outcome.critical().unwrap().delta_a_critical, 0.01);
    }

    #[test]
    fn test_undefined_resistance_is_invalid_domain() {
        let curve = |da: f64| if da > 0.05 { f64::NAN } else { 1e5 + 1e3 * da };
        let err = InstabilityAnalyzer::new(curve).analyze(0.05, 200e9, 1.0).unwrap_err();
        assert!(matches!(err, FractureError::InvalidDomain(_)));
    }

    #[test]
    fn test_stability_diagram() {
        let curve = PowerLawCurve::demo();
        let outcome = InstabilityAnalyzer::new(curve).analyze(0.05, 200e9, 1.0).unwrap();
        let result = outcome.critical().unwrap();
        assert_relative_eq!(
            result.applied_driving_force(result.delta_a_critical),
            result.r_critical,
            max_relative = 1e-12
        );

        let diagram = stability_diagram(&curve, result, 101);
        assert_eq!(diagram.len(), 101);
        assert_eq!(diagram[0].delta_a, 0.0);
        assert_eq!(diagram[0].resistance, 150e3);
        assert_relative_eq!(diagram[100].delta_a, 2.0 * result.delta_a_critical);
        assert!(diagram.windows(2).all(|w| w[1].applied > w[0].applied));
    }
}
