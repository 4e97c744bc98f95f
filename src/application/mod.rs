// Application layer: solving facade, per-family orchestration and background solves

pub mod facade;
pub mod service;
pub mod worker;

pub use facade::{EngineAssignmentSolver, SolvingFacade};
pub use service::OptimizationService;
pub use worker::{SolveHandle, SolveWorker};
