// Domain layer: canonical model, solutions and the engine interface
pub mod domain;

// Problem families: entities, validators, model builders and post-processors
pub mod problems;

// Solver adapters: engines behind SolverService, plus the greedy heuristic
pub mod solver;

// Application layer: solving facade, orchestration and background solves
pub mod application;

// Infrastructure layer: configuration files and logging
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, EngineSolution, EngineStatus, ObjectiveFunction, OptimizationProblem,
    OptimizationType, Sensitivity, Solution, SolutionStatus, SolverBackend, SolverConfig, SolverError,
    SolverService, ThroughputPolicy, Variable, VariableType,
};

pub use problems::{BuiltModel, Outcome, ProblemError};

pub use application::{OptimizationService, SolveHandle, SolveWorker, SolvingFacade};

pub use infrastructure::{init_tracing, ConfigError};

pub use solver::{GreedyAssignmentSolver, SolverFactory};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;

#[cfg(feature = "highs")]
pub use solver::HighsSolver;
