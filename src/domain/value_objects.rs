// Domain value objects shared by the canonical model and the problem families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

impl ConstraintType {
    /// Whether `lhs` compared against `rhs` holds within `tolerance`
    pub fn holds(&self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintType::LessThanOrEqual => lhs <= rhs + tolerance,
            ConstraintType::Equal => (lhs - rhs).abs() <= tolerance,
            ConstraintType::GreaterThanOrEqual => lhs >= rhs - tolerance,
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status reported by an engine adapter, before mapping to the domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Anything else (time limit, numerical trouble, ...), with the engine's description
    Other(String),
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Optimal => write!(f, "Optimal"),
            EngineStatus::Infeasible => write!(f, "Infeasible"),
            EngineStatus::Unbounded => write!(f, "Unbounded"),
            EngineStatus::Other(description) => write!(f, "Other ({})", description),
        }
    }
}

/// Status of a domain solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    /// Found optimal solution
    Optimal,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Engine missing, engine failure, time limit or cancellation
    Error,
    /// Greedy fallback placed every entity
    HeuristicOk,
    /// Greedy fallback could not place every entity
    HeuristicPartial,
}

impl SolutionStatus {
    /// Whether the status carries a usable set of values and an objective
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            SolutionStatus::Optimal | SolutionStatus::HeuristicOk | SolutionStatus::HeuristicPartial
        )
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "OPTIMAL"),
            SolutionStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolutionStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolutionStatus::Error => write!(f, "ERROR"),
            SolutionStatus::HeuristicOk => write!(f, "HEURISTIC_OK"),
            SolutionStatus::HeuristicPartial => write!(f, "HEURISTIC_PARTIAL"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Best engine compiled into this build
    #[default]
    Auto,
    /// COIN-OR CBC (through good_lp)
    CoinCbc,
    /// HiGHS
    Highs,
    /// No engine: greedy heuristic for assignments, error for every other family
    Greedy,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::Greedy => write!(f, "Greedy"),
        }
    }
}

/// Which side of a hub's traffic its throughput capacity bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputPolicy {
    /// Total inflow only
    #[default]
    Inflow,
    /// Total inflow and total outflow, each separately
    InflowAndOutflow,
}
