// Problem families: entities, validators, model builders and post-processors.
//
// Every family follows the same shape:
//   validate(&problem) -> Vec<String>
//   build(&problem)    -> Result<BuiltModel<Key>, ProblemError>
//   derive_metrics(&problem, &solution) -> Option<Metrics>

pub mod assignment;
pub mod blending;
pub mod max_flow;
pub mod multimodal;
pub mod vertex_cover;

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{Constraint, OptimizationProblem, Solution, Variable};

/// Numeric tolerance of every satisfaction check
pub const TOLERANCE: f64 = 1e-6;

/// Structural problem defects found before model construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProblemError {
    #[error("Invalid problem: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ProblemError {
    pub fn violations(&self) -> &[String] {
        match self {
            ProblemError::Invalid(violations) => violations,
        }
    }

    /// Turns a validator report into a build result
    pub(crate) fn check(violations: Vec<String>) -> Result<(), ProblemError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ProblemError::Invalid(violations))
        }
    }
}

/// A canonical model plus the domain key naming each of its variables
#[derive(Debug, Clone)]
pub struct BuiltModel<K> {
    model: OptimizationProblem,
    keys: Vec<K>,
}

impl<K> BuiltModel<K> {
    pub(crate) fn new(model: OptimizationProblem) -> Self {
        Self {
            model,
            keys: Vec::new(),
        }
    }

    pub(crate) fn add_variable(&mut self, key: K, variable: Variable, objective: f64) -> usize {
        self.keys.push(key);
        self.model.add_variable(variable, objective)
    }

    /// Rows without terms are dropped unless they are trivially violated
    pub(crate) fn add_constraint(&mut self, constraint: Constraint) {
        if constraint.terms.is_empty() && constraint.constraint_type.holds(0.0, constraint.bound, 0.0) {
            return;
        }
        self.model.add_constraint(constraint);
    }

    pub fn model(&self) -> &OptimizationProblem {
        &self.model
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn into_parts(self) -> (OptimizationProblem, Vec<K>) {
        (self.model, self.keys)
    }
}

impl<K: PartialEq> BuiltModel<K> {
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn variable(&self, key: &K) -> Option<&Variable> {
        self.index_of(key).map(|i| &self.model.variables[i])
    }

    pub fn objective_coefficient(&self, key: &K) -> Option<f64> {
        self.index_of(key).map(|i| self.model.objective.coefficients[i])
    }
}

/// A solution plus the domain metrics derived from it
#[derive(Debug, Clone)]
pub struct Outcome<K: Ord, M> {
    pub solution: Solution<K>,
    pub metrics: Option<M>,
}

/// Symmetric-pair normalization for undirected relations
pub(crate) fn unordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Each identifier appearing more than once, reported once, in first-seen order
pub(crate) fn duplicates<T: Ord + Clone>(ids: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    let mut result = Vec::new();
    for id in ids {
        if !seen.insert(id.clone()) && reported.insert(id.clone()) {
            result.push(id);
        }
    }
    result
}

pub(crate) fn check_non_negative(
    violations: &mut Vec<String>,
    what: impl fmt::Display,
    value: f64,
) {
    if !value.is_finite() || value < 0.0 {
        violations.push(format!("{} must be a finite value >= 0 (got {})", what, value));
    }
}

pub(crate) fn check_positive(violations: &mut Vec<String>, what: impl fmt::Display, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        violations.push(format!("{} must be a finite value > 0 (got {})", what, value));
    }
}
