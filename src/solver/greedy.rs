// Greedy assignment heuristic, used when no MILP engine is available
// or when the configuration asks for it explicitly.

use crate::domain::{Solution, SolutionStatus};
use crate::problems::assignment::{
    validate, AssignmentKey, AssignmentProblem, AssignmentSolver, ProjectId,
};
use crate::problems::ProblemError;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Caveat carried in every greedy solution message
pub const GREEDY_LIMITATIONS: &str =
    "minimum capacities and incompatibilities are not enforced by the greedy heuristic";

/// Deterministic first-fit on preference order.
///
/// Students are placed in ascending id order. Each takes its best-scored project
/// with `assigned < capacity_max` (ties by ascending project id), else the first
/// declared project with room at score 0. Minimum capacities and incompatibilities
/// are ignored; the assignment metrics surface any resulting violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssignmentSolver;

impl GreedyAssignmentSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentSolver for GreedyAssignmentSolver {
    fn solve(
        &self,
        problem: &AssignmentProblem,
        _time_limit: Option<Duration>,
    ) -> Result<Solution<AssignmentKey>, ProblemError> {
        ProblemError::check(validate(problem))?;
        let start_time = Instant::now();

        let mut load: BTreeMap<ProjectId, u32> = problem.projects.iter().map(|p| (p.id, 0)).collect();
        let has_room = |load: &BTreeMap<ProjectId, u32>, project: ProjectId| {
            problem
                .project(project)
                .is_some_and(|p| load.get(&project).copied().unwrap_or(0) < p.capacity_max)
        };

        let mut students: Vec<_> = problem.students.iter().collect();
        students.sort_by_key(|s| s.id);

        let mut values = BTreeMap::new();
        let mut total_score = 0.0;
        let mut unplaced = Vec::new();

        for student in students {
            let mut ranked: Vec<(ProjectId, f64)> =
                student.preferences.iter().map(|(&p, &score)| (p, score)).collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

            let choice = ranked
                .iter()
                .find(|&&(project, _)| has_room(&load, project))
                .copied()
                .or_else(|| {
                    problem
                        .projects
                        .iter()
                        .find(|p| has_room(&load, p.id))
                        .map(|p| (p.id, 0.0))
                });

            match choice {
                Some((project, score)) => {
                    *load.entry(project).or_default() += 1;
                    values.insert((student.id, project), 1.0);
                    total_score += score;
                    tracing::debug!(student = student.id, project, score, "greedy placement");
                }
                None => unplaced.push(student.id),
            }
        }

        let (status, message) = if unplaced.is_empty() {
            (
                SolutionStatus::HeuristicOk,
                format!("Every student placed; {}", GREEDY_LIMITATIONS),
            )
        } else {
            (
                SolutionStatus::HeuristicPartial,
                format!(
                    "{} student(s) could not be placed ({:?}); {}",
                    unplaced.len(),
                    unplaced,
                    GREEDY_LIMITATIONS
                ),
            )
        };
        tracing::info!(
            event = "greedy_end",
            status = %status,
            objective = total_score,
            unplaced = unplaced.len(),
        );

        Ok(Solution::found(status, total_score, values, start_time.elapsed(), message))
    }

    fn name(&self) -> &str {
        "Greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::assignment::{derive_metrics, Project, Student};

    fn scenario() -> AssignmentProblem {
        AssignmentProblem::new(
            vec![
                Student::new(3, "Charlie").with_preference(101, 7.0).with_preference(102, 9.0),
                Student::new(1, "Alice").with_preference(101, 10.0).with_preference(102, 3.0),
                Student::new(2, "Bob").with_preference(101, 5.0).with_preference(102, 8.0),
            ],
            vec![
                Project::new(101, "Web", 1, 2),
                Project::new(102, "Mobile", 1, 2),
            ],
        )
    }

    #[test]
    fn follows_preferences_in_id_order() {
        let solution = GreedyAssignmentSolver::new().solve(&scenario(), None).unwrap();

        assert_eq!(solution.status(), SolutionStatus::HeuristicOk);
        assert_eq!(solution.value(&(1, 101)), 1.0);
        assert_eq!(solution.value(&(2, 102)), 1.0);
        assert_eq!(solution.value(&(3, 102)), 1.0);
        assert_eq!(solution.values().len(), 3);
        assert_eq!(solution.objective_value(), Some(27.0));
        assert!(solution.message().contains("not enforced"));
    }

    #[test]
    fn falls_back_to_first_project_with_room() {
        let problem = AssignmentProblem::new(
            vec![
                Student::new(1, "A").with_preference(101, 4.0),
                Student::new(2, "B").with_preference(101, 6.0),
            ],
            vec![Project::new(100, "Spare", 0, 5), Project::new(101, "Hot", 0, 1)],
        );
        let solution = GreedyAssignmentSolver::new().solve(&problem, None).unwrap();

        assert_eq!(solution.value(&(1, 101)), 1.0);
        assert_eq!(solution.value(&(2, 100)), 1.0);
        assert_eq!(solution.objective_value(), Some(4.0));
    }

    #[test]
    fn ties_broken_by_project_id() {
        let problem = AssignmentProblem::new(
            vec![Student::new(1, "A").with_preference(102, 5.0).with_preference(101, 5.0)],
            vec![Project::new(102, "B", 0, 1), Project::new(101, "A", 0, 1)],
        );
        let solution = GreedyAssignmentSolver::new().solve(&problem, None).unwrap();
        assert_eq!(solution.value(&(1, 101)), 1.0);
    }

    #[test]
    fn partial_when_capacity_runs_out() {
        let problem = AssignmentProblem::new(
            vec![
                Student::new(1, "A").with_preference(101, 1.0),
                Student::new(2, "B").with_preference(101, 1.0),
                Student::new(3, "C"),
            ],
            vec![Project::new(101, "Only", 0, 1)],
        );
        let solution = GreedyAssignmentSolver::new().solve(&problem, None).unwrap();

        assert_eq!(solution.status(), SolutionStatus::HeuristicPartial);
        assert!(solution.has_solution());
        assert_eq!(solution.values().len(), 1);
        assert!(solution.message().contains("[2, 3]"));
    }

    #[test]
    fn ignored_constraints_show_up_in_metrics() {
        let problem = AssignmentProblem::new(
            vec![
                Student::new(1, "A").with_preference(101, 5.0).with_incompatibility(2),
                Student::new(2, "B").with_preference(101, 5.0),
            ],
            vec![Project::new(101, "Popular", 0, 2), Project::new(102, "Quiet", 1, 2)],
        );
        let solution = GreedyAssignmentSolver::new().solve(&problem, None).unwrap();
        assert_eq!(solution.status(), SolutionStatus::HeuristicOk);

        let metrics = derive_metrics(&problem, &solution).unwrap();
        assert!(!metrics.constraints_satisfied["incompatible_1_2"]);
        assert!(!metrics.constraints_satisfied["cap_min_102"]);
        assert!(metrics.constraints_satisfied["all_assigned"]);
    }

    #[test]
    fn invalid_problems_rejected() {
        let problem = AssignmentProblem::new(vec![Student::new(1, "A")], Vec::new());
        assert!(GreedyAssignmentSolver::new().solve(&problem, None).is_err());
    }
}
