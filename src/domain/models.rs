use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::value_objects::{
    ConstraintType, EngineStatus, OptimizationType, SolverBackend, ThroughputPolicy, VariableType,
};

/// Decision variable in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// Objective function to minimize or maximize.
///
/// Holds one coefficient per variable, indexed like `OptimizationProblem::variables`.
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub coefficients: Vec<f64>,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, coefficients: Vec<f64>) -> Self {
        Self {
            optimization_type,
            coefficients,
        }
    }

    pub fn minimize() -> Self {
        Self::new(OptimizationType::Minimize, Vec::new())
    }

    pub fn maximize() -> Self {
        Self::new(OptimizationType::Maximize, Vec::new())
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    /// Objective value for a full assignment of variable values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coeff, value)| coeff * value)
            .sum()
    }
}

/// Sparse linear constraint: Σ coefficient·x[index] (op) bound
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub terms: Vec<(usize, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, bound: f64) -> Self {
        Self {
            constraint_type,
            terms: Vec::new(),
            bound,
            name: String::new(),
        }
    }

    pub fn le(bound: f64) -> Self {
        Self::new(ConstraintType::LessThanOrEqual, bound)
    }

    pub fn eq(bound: f64) -> Self {
        Self::new(ConstraintType::Equal, bound)
    }

    pub fn ge(bound: f64) -> Self {
        Self::new(ConstraintType::GreaterThanOrEqual, bound)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds `coefficient * x[variable]`; zero coefficients contribute nothing and are dropped
    pub fn with_term(mut self, variable: usize, coefficient: f64) -> Self {
        self.add_term(variable, coefficient);
        self
    }

    pub fn add_term(&mut self, variable: usize, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.push((variable, coefficient));
        }
    }

    pub fn with_terms(mut self, terms: impl IntoIterator<Item = (usize, f64)>) -> Self {
        for (variable, coefficient) in terms {
            self.add_term(variable, coefficient);
        }
        self
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Left-hand side evaluated against a full assignment of variable values
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(i, coeff)| coeff * values.get(i).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.constraint_type
            .holds(self.lhs(values), self.bound, tolerance)
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
    /// Ask the engine for dual values and reduced costs
    pub sensitivity: bool,
    pub throughput_policy: ThroughputPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            gap_tolerance: None,
            verbose: false,
            sensitivity: true,
            throughput_policy: ThroughputPolicy::Inflow,
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit.as_secs_f64());
        self
    }

    pub fn with_throughput_policy(mut self, policy: ThroughputPolicy) -> Self {
        self.throughput_policy = policy;
        self
    }

    /// `None` when unset, negative, non-finite or too large for a `Duration`
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Canonical optimization model handed to an engine
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub description: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Appends a variable together with its objective coefficient, returning its index
    pub fn add_variable(&mut self, variable: Variable, objective_coefficient: f64) -> usize {
        self.variables.push(variable);
        self.objective.coefficients.push(objective_coefficient);
        self.variables.len() - 1
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_problem(problem: &OptimizationProblem, solve_time: Duration) -> Self {
        let num_binary = problem
            .variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count() as u32;
        let num_integer = problem
            .variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Integer)
            .count() as u32;

        Self {
            solve_time_ms: solve_time.as_secs_f64() * 1000.0,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.num_constraints() as u32,
            num_integer_vars: num_integer,
            num_binary_vars: num_binary,
        }
    }
}

/// Raw engine answer, indexed like the problem's variables and constraints
#[derive(Debug, Clone)]
pub struct EngineSolution {
    pub status: EngineStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    /// One per constraint, empty when the engine did not report duals
    pub dual_values: Vec<f64>,
    /// One per variable, empty when the engine did not report them
    pub reduced_costs: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl EngineSolution {
    pub fn new(status: EngineStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            dual_values: Vec::new(),
            reduced_costs: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: EngineStatus::Optimal,
            objective_value: Some(value),
            variable_values,
            dual_values: Vec::new(),
            reduced_costs: Vec::new(),
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_sensitivity(mut self, dual_values: Vec<f64>, reduced_costs: Vec<f64>) -> Self {
        self.dual_values = dual_values;
        self.reduced_costs = reduced_costs;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == EngineStatus::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_variable_keeps_objective_aligned() {
        let mut problem = OptimizationProblem::new(ObjectiveFunction::maximize());
        let x = problem.add_variable(Variable::binary("x"), 3.0);
        let y = problem.add_variable(Variable::continuous("y"), 0.0);

        assert_eq!((x, y), (0, 1));
        assert_eq!(problem.objective.coefficients, vec![3.0, 0.0]);
        assert_eq!(problem.num_integer_variables(), 1);
        assert!(problem.is_mixed_integer());
    }

    #[test]
    fn zero_coefficients_are_dropped() {
        let c = Constraint::le(4.0).with_term(0, 1.0).with_term(1, 0.0).with_term(2, -2.0);
        assert_eq!(c.terms, vec![(0, 1.0), (2, -2.0)]);
        assert_eq!(c.lhs(&[1.0, 5.0, 1.0]), -1.0);
        assert!(c.is_satisfied(&[1.0, 5.0, 1.0], 1e-6));
    }

    #[test]
    fn equality_uses_tolerance() {
        let c = Constraint::eq(1.0).with_terms([(0, 1.0), (1, 1.0)]);
        assert!(c.is_satisfied(&[0.5, 0.5000001], 1e-6));
        assert!(!c.is_satisfied(&[0.5, 0.6], 1e-6));
    }

    #[test]
    fn time_limit_ignores_nonsense() {
        let mut config = SolverConfig::default();
        config.time_limit = Some(-1.0);
        assert_eq!(config.time_limit(), None);

        config.time_limit = Some(1e30);
        assert_eq!(config.time_limit(), None);

        config.time_limit = Some(f64::NAN);
        assert_eq!(config.time_limit(), None);

        let config = SolverConfig::default().with_time_limit(Duration::from_secs(5));
        assert_eq!(config.time_limit(), Some(Duration::from_secs(5)));
    }
}
