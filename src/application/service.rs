// Per-family orchestration: validate -> build -> solve (engine or greedy) -> derive metrics

use crate::application::facade::{EngineAssignmentSolver, SolvingFacade};
use crate::domain::{SolverBackend, SolverConfig};
use crate::problems::assignment::{self, AssignmentKey, AssignmentMetrics, AssignmentProblem, AssignmentSolver};
use crate::problems::blending::{self, BlendingMetrics, BlendingProblem};
use crate::problems::max_flow::{self, ArcKey, MaxFlowMetrics, MaxFlowProblem};
use crate::problems::multimodal::{self, LinkKey, MultiModalMetrics, MultiModalProblem};
use crate::problems::vertex_cover::{self, GateId, VertexCoverMetrics, VertexCoverProblem};
use crate::problems::{Outcome, ProblemError};
use crate::solver::GreedyAssignmentSolver;
use std::sync::Arc;

pub type Result<K, M> = std::result::Result<Outcome<K, M>, ProblemError>;

/// Entry point for solving any of the supported problem families
#[derive(Clone)]
pub struct OptimizationService {
    facade: SolvingFacade,
    assignment_solver: Arc<dyn AssignmentSolver>,
}

impl OptimizationService {
    /// Assignments go to the greedy heuristic when it is configured or no engine exists
    pub fn new(facade: SolvingFacade) -> Self {
        let assignment_solver: Arc<dyn AssignmentSolver> =
            if facade.config().backend == SolverBackend::Greedy || !facade.is_engine_available() {
                Arc::new(GreedyAssignmentSolver::new())
            } else {
                Arc::new(EngineAssignmentSolver::new(facade.clone()))
            };
        tracing::debug!(
            engine = facade.engine_name().unwrap_or("none"),
            assignment_solver = assignment_solver.name(),
            "optimization service ready"
        );
        Self {
            facade,
            assignment_solver,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(SolvingFacade::from_config(config))
    }

    pub fn with_assignment_solver(mut self, solver: Arc<dyn AssignmentSolver>) -> Self {
        self.assignment_solver = solver;
        self
    }

    pub fn facade(&self) -> &SolvingFacade {
        &self.facade
    }

    pub fn config(&self) -> &SolverConfig {
        self.facade.config()
    }

    pub fn assignment_solver_name(&self) -> &str {
        self.assignment_solver.name()
    }

    pub fn solve_assignment(&self, problem: &AssignmentProblem) -> Result<AssignmentKey, AssignmentMetrics> {
        let solution = self.assignment_solver.solve(problem, self.config().time_limit())?;
        let metrics = assignment::derive_metrics(problem, &solution);
        Ok(Outcome { solution, metrics })
    }

    pub fn solve_max_flow(&self, problem: &MaxFlowProblem) -> Result<ArcKey, MaxFlowMetrics> {
        let built = max_flow::build(problem)?;
        let solution = self.facade.solve(built, self.config().time_limit());
        let metrics = max_flow::derive_metrics(problem, &solution);
        Ok(Outcome { solution, metrics })
    }

    pub fn solve_multimodal(&self, problem: &MultiModalProblem) -> Result<LinkKey, MultiModalMetrics> {
        let policy = self.config().throughput_policy;
        let built = multimodal::build(problem, policy)?;
        let solution = self.facade.solve(built, self.config().time_limit());
        let metrics = multimodal::derive_metrics(problem, &solution, policy);
        Ok(Outcome { solution, metrics })
    }

    pub fn solve_blending(&self, problem: &BlendingProblem) -> Result<String, BlendingMetrics> {
        let built = blending::build(problem)?;
        let solution = self.facade.solve(built, self.config().time_limit());
        let metrics = blending::derive_metrics(problem, &solution);
        Ok(Outcome { solution, metrics })
    }

    pub fn solve_vertex_cover(&self, problem: &VertexCoverProblem) -> Result<GateId, VertexCoverMetrics> {
        let built = vertex_cover::build(problem)?;
        let solution = self.facade.solve(built, self.config().time_limit());
        let metrics = vertex_cover::derive_metrics(problem, &solution);
        Ok(Outcome { solution, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SolutionStatus;
    use crate::problems::assignment::{Project, Student};
    use crate::problems::vertex_cover::Gate;

    fn offline() -> OptimizationService {
        OptimizationService::new(SolvingFacade::unavailable())
    }

    #[test]
    fn assignments_fall_back_to_greedy_without_engine() {
        let service = offline();
        assert_eq!(service.assignment_solver_name(), "Greedy");

        let problem = AssignmentProblem::new(
            vec![Student::new(1, "A").with_preference(7, 2.0)],
            vec![Project::new(7, "P", 0, 1)],
        );
        let outcome = service.solve_assignment(&problem).unwrap();
        assert_eq!(outcome.solution.status(), SolutionStatus::HeuristicOk);
        assert_eq!(outcome.metrics.unwrap().student_assignments[&1], 7);
    }

    #[test]
    fn other_families_report_error_without_engine() {
        let problem = VertexCoverProblem::new(vec![Gate::new("A", 1.0), Gate::new("B", 2.0)]).with_wire("A", "B");
        let outcome = offline().solve_vertex_cover(&problem).unwrap();
        assert_eq!(outcome.solution.status(), SolutionStatus::Error);
        assert!(outcome.metrics.is_none());
    }

    #[test]
    fn greedy_backend_is_explicit() {
        let config = SolverConfig::default().with_backend(SolverBackend::Greedy);
        let service = OptimizationService::from_config(&config);
        assert!(!service.facade().is_engine_available());
        assert_eq!(service.assignment_solver_name(), "Greedy");
    }

    #[test]
    fn validation_errors_surface_before_solving() {
        let problem = MaxFlowProblem::new(["s", "t"]).with_arc("s", "t", 1.0);
        let err = offline().solve_max_flow(&problem).unwrap_err();
        assert!(err.violations()[0].contains("source and a sink"));
    }

    #[test]
    fn assignment_solver_can_be_replaced() {
        let service = offline()
            .with_assignment_solver(Arc::new(EngineAssignmentSolver::new(SolvingFacade::unavailable())));
        assert_eq!(service.assignment_solver_name(), "unavailable");

        let problem = AssignmentProblem::new(vec![Student::new(1, "A")], vec![Project::new(7, "P", 0, 1)]);
        let outcome = service.solve_assignment(&problem).unwrap();
        assert_eq!(outcome.solution.status(), SolutionStatus::Error);
        assert!(outcome.metrics.is_none());
    }

    #[test]
    fn oversized_time_limit_does_not_panic() {
        let config = SolverConfig {
            time_limit: Some(1e30),
            ..SolverConfig::default().with_backend(SolverBackend::Greedy)
        };
        let service = OptimizationService::from_config(&config);
        let problem = MaxFlowProblem::new(["s", "t"]).with_arc("s", "t", 3.0).with_terminals("s", "t");

        let outcome = service.solve_max_flow(&problem).unwrap();
        assert_eq!(outcome.solution.status(), SolutionStatus::Error);
    }
}
