//! Adaptive Gauss–Kronrod quadrature.
//!
//! Each subinterval is integrated with the 15-point Kronrod rule and the embedded 7-point
//! Gauss rule; their difference is the local error estimate. The subinterval carrying the
//! largest error is bisected until the summed error drops below
//! `max(abs_tol, rel_tol * |estimate|)` or the subinterval limit is reached.

use log::debug;

use crate::error::{FractureError, Result};

// Kronrod abscissae on [0, 1], descending; odd indices are the Gauss nodes.
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// Tolerances and limits for [`integrate`].
///
/// The default has no absolute floor: cycle counts span many decades depending on the
/// unit system, so convergence is judged relative to the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_intervals: usize,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            abs_tol: 0.0,
            rel_tol: 1.49e-8,
            max_intervals: 200,
        }
    }
}

/// Converged integral with its error estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub error: f64,
    pub intervals: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

fn gauss_kronrod<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> Result<Segment> {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(center);
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];
    let mut finite = fc.is_finite();

    for j in 0..7 {
        let dx = half * XGK[j];
        let sum = f(center - dx) + f(center + dx);
        finite &= sum.is_finite();
        kronrod += WGK[j] * sum;
        if j % 2 == 1 {
            gauss += WG[j / 2] * sum;
        }
    }

    if !finite {
        return Err(FractureError::domain(format!(
            "integrand is not finite on [{}, {}]",
            a, b
        )));
    }

    Ok(Segment {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

/// Integrates `f` over `[a, b]`.
///
/// The integrand must be finite on the closed interval; a non-finite sample is reported
/// as [`FractureError::InvalidDomain`]. Failing to meet the tolerance within
/// `max_intervals` subintervals is reported as [`FractureError::NonConvergence`].
pub fn integrate<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: &Tolerance) -> Result<Quadrature> {
    if !a.is_finite() || !b.is_finite() {
        return Err(FractureError::domain(format!(
            "integration bounds must be finite, got [{}, {}]",
            a, b
        )));
    }
    if a == b {
        return Ok(Quadrature { value: 0.0, error: 0.0, intervals: 0 });
    }
    if a > b {
        let reversed = integrate(f, b, a, tol)?;
        return Ok(Quadrature { value: -reversed.value, ..reversed });
    }

    let mut segments = vec![gauss_kronrod(&f, a, b)?];
    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();

        if error <= tol.abs_tol.max(tol.rel_tol * value.abs()) {
            debug!(
                "quadrature on [{}, {}] converged: {} (error {}, {} subintervals)",
                a,
                b,
                value,
                error,
                segments.len()
            );
            return Ok(Quadrature { value, error, intervals: segments.len() });
        }
        if segments.len() >= tol.max_intervals {
            return Err(FractureError::NonConvergence {
                estimate: value,
                error,
                intervals: segments.len(),
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.error.total_cmp(&y.1.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let segment = segments.swap_remove(worst);
        let mid = 0.5 * (segment.a + segment.b);
        segments.push(gauss_kronrod(&f, segment.a, mid)?);
        segments.push(gauss_kronrod(&f, mid, segment.b)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polynomial_is_exact() {
        // The Kronrod rule is exact for polynomials up to degree 22.
        let q = integrate(|x| 3.0 * x * x + 2.0 * x + 1.0, 0.0, 2.0, &Tolerance::default()).unwrap();
        assert_relative_eq!(q.value, 14.0, epsilon = 1e-12);
        assert_eq!(q.intervals, 1);
    }

    #[test]
    fn test_exponential_and_reversed_bounds() {
        let tol = Tolerance::default();
        let q = integrate(f64::exp, 0.0, 1.0, &tol).unwrap();
        assert_relative_eq!(q.value, std::f64::consts::E - 1.0, max_relative = 1e-12);

        let r = integrate(f64::exp, 1.0, 0.0, &tol).unwrap();
        assert_relative_eq!(r.value, -q.value, max_relative = 1e-14);

        let empty = integrate(f64::exp, 0.5, 0.5, &tol).unwrap();
        assert_eq!(empty.value, 0.0);
    }

    #[test]
    fn test_near_singular_integrand_subdivides() {
        // 1/sqrt(x) on [1e-8, 1] = 2 - 2e-4
        let q = integrate(|x: f64| 1.0 / x.sqrt(), 1e-8, 1.0, &Tolerance::default()).unwrap();
        assert!(q.intervals > 1);
        assert_relative_eq!(q.value, 2.0 - 2e-4, max_relative = 1e-8);
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let tol = Tolerance { abs_tol: 0.0, rel_tol: 1e-15, max_intervals: 2 };
        let err = integrate(|x: f64| (50.0 * x).sin().abs(), 0.0, 3.0, &tol).unwrap_err();
        match err {
            FractureError::NonConvergence { intervals, .. } => assert_eq!(intervals, 2),
            other => panic!("expected non-convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_integrand_is_rejected() {
        let err = integrate(|x: f64| (x - 0.5).sqrt(), 0.0, 1.0, &Tolerance::default()).unwrap_err();
        assert!(matches!(err, FractureError::InvalidDomain(_)));
    }
}
