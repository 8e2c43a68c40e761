//! Parameter validation: per-field ranges plus cross-field relations.
//!
//! Every check always runs. The caller receives the complete batch of
//! violations in check order, with relational violations repeated for every
//! field they involve so a form can highlight all implicated inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::{ParameterId, ParameterSet};

/// Absolute range a single field must lie in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterRange {
    /// `min <= value <= max`.
    Closed { min: f64, max: f64 },
    /// Finite and `value > 0`.
    Positive,
}

impl ParameterRange {
    /// The fixed range for a parameter.
    pub fn of(id: ParameterId) -> Self {
        match id {
            ParameterId::OuterDiameter => ParameterRange::Closed {
                min: 100.0,
                max: 500.0,
            },
            ParameterId::Thickness => ParameterRange::Closed {
                min: 10.0,
                max: 80.0,
            },
            ParameterId::HoleDiameter => ParameterRange::Closed {
                min: 26.0,
                max: 51.0,
            },
            ParameterId::ChamferRadius => ParameterRange::Closed {
                min: 2.0,
                max: 10.0,
            },
            ParameterId::RecessRadius | ParameterId::RecessDepth => ParameterRange::Positive,
        }
    }

    /// Non-finite values are never contained.
    pub fn contains(self, value: f64) -> bool {
        match self {
            ParameterRange::Closed { min, max } => (min..=max).contains(&value),
            ParameterRange::Positive => positive(value),
        }
    }

    fn violation_message(self, id: ParameterId) -> String {
        match self {
            ParameterRange::Closed { min, max } => format!(
                "{} {} must be in the range [{}, {}] mm.",
                id.label(),
                id.symbol(),
                format_mm(min),
                format_mm(max)
            ),
            ParameterRange::Positive => {
                format!(
                    "{} {} must be a finite value greater than 0.",
                    id.label(),
                    id.symbol()
                )
            }
        }
    }
}

/// One violated constraint, attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationError {
    pub parameter: ParameterId,
    pub message: String,
}

impl ValidationError {
    pub fn new(parameter: ParameterId, message: impl Into<String>) -> Self {
        Self {
            parameter,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameter.symbol(), self.message)
    }
}

/// The complete, ordered batch of violations from one validation pass.
/// Empty means the parameter set is buildable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors attributed to one field, in check order.
    pub fn for_parameter(&self, id: ParameterId) -> impl Iterator<Item = &ValidationError> + '_ {
        self.errors.iter().filter(move |e| e.parameter == id)
    }

    /// Distinct implicated fields, in order of first appearance.
    pub fn implicated(&self) -> Vec<ParameterId> {
        let mut seen = Vec::new();
        for error in &self.errors {
            if !seen.contains(&error.parameter) {
                seen.push(error.parameter);
            }
        }
        seen
    }

    /// Hand every error to a per-field sink, e.g. a form that marks the
    /// matching input.
    pub fn dispatch<F>(&self, mut sink: F)
    where
        F: FnMut(ParameterId, &str),
    {
        for error in &self.errors {
            sink(error.parameter, &error.message);
        }
    }

    /// `Ok` when valid, otherwise the report itself as the error value.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn push(&mut self, parameter: ParameterId, message: &str) {
        self.errors.push(ValidationError::new(parameter, message));
    }

    fn push_all(&mut self, parameters: &[ParameterId], message: &str) {
        for &p in parameters {
            self.push(p, message);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            None => write!(f, "parameters are valid"),
            Some(first) => write!(
                f,
                "{} parameter violation(s), first: {}",
                self.errors.len(),
                first
            ),
        }
    }
}

impl std::error::Error for ValidationReport {}

impl IntoIterator for ValidationReport {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Validate a parameter set, collecting every violation.
pub fn validate_all(params: &ParameterSet) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_ranges(params, &mut report);
    check_relations(params, &mut report);
    report
}

fn check_ranges(params: &ParameterSet, report: &mut ValidationReport) {
    for id in ParameterId::ALL {
        let range = ParameterRange::of(id);
        if !range.contains(params.get(id)) {
            report.push(id, &range.violation_message(id));
        }
    }
}

/// Finite and strictly positive.
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Relations only run when the fields they reference are finite and
/// positive; otherwise the range pass has already flagged them.
fn check_relations(params: &ParameterSet, report: &mut ValidationReport) {
    use ParameterId::*;

    let outer = params.outer_diameter();
    let thickness = params.thickness();
    let hole = params.hole_diameter();
    let recess_radius = params.recess_radius();
    let recess_depth = params.recess_depth();

    // T <= D/10
    if positive(outer) && thickness > outer / 10.0 {
        report.push_all(&[Thickness, OuterDiameter], "Thickness T must satisfy T ≤ D/10.");
    }

    // d < D
    if positive(outer) && hole >= outer {
        report.push_all(
            &[HoleDiameter, OuterDiameter],
            "Hole diameter d must be smaller than outer diameter D (d < D).",
        );
    }

    // d < 2L < D, with L a radius and d, D diameters
    if positive(outer) && positive(recess_radius) && positive(hole) {
        let min_l = hole / 2.0;
        let max_l = outer / 2.0;
        if !(recess_radius > min_l && recess_radius < max_l) {
            let message = format!(
                "Recess radius L must satisfy d < 2L < D, i.e. L must lie in ({}; {}) mm.",
                format_mm(min_l),
                format_mm(max_l)
            );
            report.push_all(&[RecessRadius, HoleDiameter, OuterDiameter], &message);
        }
    }

    // 0 < G < T
    if positive(recess_depth) && positive(thickness) && recess_depth >= thickness {
        report.push_all(
            &[RecessDepth, Thickness],
            "Recess depth G must satisfy 0 < G < T.",
        );
    }
}

/// Format a millimeter value with at most three decimals, trailing zeros
/// trimmed: `15`, `12.5`, `0.333`.
pub fn format_mm(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
