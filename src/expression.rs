//! Resistance curves written as arithmetic expressions in the crack extension `da`.
//!
//! ```
//! use std::collections::HashMap;
//! use griffith::expression::ExpressionCurve;
//! use griffith::r_curve::ResistanceCurve;
//!
//! let mut parameters = HashMap::new();
//! parameters.insert("j0".to_string(), 150.0);
//! let curve = ExpressionCurve::new("(j0 + 400 * math::sqrt(da)) * 1000", &parameters).unwrap();
//! assert!((curve.resistance(0.01) - 190_000.0).abs() < 1e-6);
//! ```

use std::collections::HashMap;

use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};
use log::debug;
use regex::Regex;

use crate::error::{FractureError, Result};
use crate::r_curve::ResistanceCurve;

/// Name of the crack-extension variable inside an expression.
pub const VARIABLE: &str = "da";

#[derive(Debug, Clone)]
pub struct ExpressionCurve {
    source: String,
    tree: Node,
    context: HashMapContext,
}

impl ExpressionCurve {
    /// Compiles `expression` with the given named parameters.
    ///
    /// The expression is evaluated once at `da = 1e-3` so that unknown identifiers and
    /// non-numeric results are reported here rather than during a sweep.
    pub fn new(expression: &str, parameters: &HashMap<String, f64>) -> Result<Self> {
        if expression.trim().is_empty() {
            return Err(FractureError::Expression("expression must not be empty".into()));
        }
        let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
            .map_err(|e| FractureError::Expression(e.to_string()))?;

        let mut context = HashMapContext::new();
        for (key, value) in parameters {
            if !re.is_match(key) {
                return Err(FractureError::Expression(format!("Invalid parameter name: {}", key)));
            }
            if key == VARIABLE {
                return Err(FractureError::Expression(format!(
                    "'{}' is reserved for the crack extension",
                    VARIABLE
                )));
            }
            if !value.is_finite() {
                return Err(FractureError::Expression(format!(
                    "parameter '{}' must be a finite number, got {}",
                    key, value
                )));
            }
            context
                .set_value(key.clone(), Value::Float(*value))
                .map_err(|e| FractureError::Expression(format!("Failed to insert parameter '{}': {}", key, e)))?;
        }

        let tree = build_operator_tree(expression)
            .map_err(|e| FractureError::Expression(format!("Failed to parse '{}': {}", expression, e)))?;

        let curve = ExpressionCurve { source: expression.to_owned(), tree, context };
        let sample = curve.evaluate(1e-3)?;
        if !sample.is_finite() {
            return Err(FractureError::Expression(format!(
                "'{}' does not evaluate to a finite number, got {}",
                expression, sample
            )));
        }
        Ok(curve)
    }

    /// Evaluates the expression for one crack extension.
    pub fn evaluate(&self, delta_a: f64) -> Result<f64> {
        let mut context = self.context.clone();
        context
            .set_value(VARIABLE.to_owned(), Value::Float(delta_a))
            .map_err(|e| FractureError::Expression(e.to_string()))?;
        self.tree
            .eval_number_with_context(&context)
            .map_err(|e| FractureError::Expression(format!("Failed to evaluate '{}': {}", self.source, e)))
    }
}

impl ResistanceCurve for ExpressionCurve {
    /// Evaluation failures become `NaN`.
    fn resistance(&self, delta_a: f64) -> f64 {
        match self.evaluate(delta_a) {
            Ok(r) => r,
            Err(e) => {
                debug!("resistance at delta_a={} is undefined: {}", delta_a, e);
                f64::NAN
            }
        }
    }

    fn checked_resistance(&self, delta_a: f64) -> Result<f64> {
        let r = self.evaluate(delta_a)?;
        if !r.is_finite() {
            return Err(FractureError::Expression(format!(
                "'{}' is not finite at da={}: {}",
                self.source, delta_a, r
            )));
        }
        Ok(r)
    }
}
