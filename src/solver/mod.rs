// Solver adapters: engine implementations of SolverService, plus the greedy heuristic

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc_solver;
pub mod factory;
pub mod greedy;
#[cfg(feature = "highs")]
pub mod highs_solver;

#[cfg(feature = "coin_cbc")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::SolverFactory;
pub use greedy::{GreedyAssignmentSolver, GREEDY_LIMITATIONS};
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
