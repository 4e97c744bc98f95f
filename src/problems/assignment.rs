// Student-to-project assignment.
//
// One binary variable `x_{s}_{p}` per (student, project) pair:
//
// * every student is assigned to exactly one project,
// * every project receives between `capacity_min` and `capacity_max` students,
// * two incompatible students never share a project,
//
// maximizing the sum of the preference scores of the chosen pairs.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::{duplicates, unordered, BuiltModel, ProblemError, TOLERANCE};
use crate::domain::{Constraint, ObjectiveFunction, OptimizationProblem, Solution, Variable};

pub type StudentId = u32;
pub type ProjectId = u32;

/// Decision-variable key: (student, project)
pub type AssignmentKey = (StudentId, ProjectId);

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    /// Preference score per project, higher is better
    pub preferences: BTreeMap<ProjectId, f64>,
    pub incompatible_with: Vec<StudentId>,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            preferences: BTreeMap::new(),
            incompatible_with: Vec::new(),
        }
    }

    pub fn with_preference(mut self, project: ProjectId, score: f64) -> Self {
        self.preferences.insert(project, score);
        self
    }

    pub fn with_incompatibility(mut self, other: StudentId) -> Self {
        self.incompatible_with.push(other);
        self
    }

    /// Score for `project`; no declared preference scores zero
    pub fn preference(&self, project: ProjectId) -> f64 {
        self.preferences.get(&project).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub capacity_min: u32,
    pub capacity_max: u32,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, capacity_min: u32, capacity_max: u32) -> Self {
        Self {
            id,
            name: name.into(),
            capacity_min,
            capacity_max,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentProblem {
    pub students: Vec<Student>,
    pub projects: Vec<Project>,
}

impl AssignmentProblem {
    pub fn new(students: Vec<Student>, projects: Vec<Project>) -> Self {
        Self { students, projects }
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Incompatible pairs normalized to (low, high), self-pairs and unknown students skipped
    pub fn incompatible_pairs(&self) -> BTreeSet<(StudentId, StudentId)> {
        let known: BTreeSet<StudentId> = self.students.iter().map(|s| s.id).collect();
        self.students
            .iter()
            .flat_map(|s| s.incompatible_with.iter().map(move |&other| (s.id, other)))
            .filter(|(a, b)| a != b && known.contains(b))
            .map(|(a, b)| unordered(a, b))
            .collect()
    }
}

/// Interchangeable ways of answering an assignment problem (engine-backed or heuristic)
pub trait AssignmentSolver: Send + Sync {
    fn solve(
        &self,
        problem: &AssignmentProblem,
        time_limit: Option<Duration>,
    ) -> Result<Solution<AssignmentKey>, ProblemError>;

    fn name(&self) -> &str;
}

pub fn validate(problem: &AssignmentProblem) -> Vec<String> {
    let mut violations = Vec::new();

    for id in duplicates(problem.students.iter().map(|s| s.id)) {
        violations.push(format!("Duplicate student id {}", id));
    }
    for id in duplicates(problem.projects.iter().map(|p| p.id)) {
        violations.push(format!("Duplicate project id {}", id));
    }

    if !problem.students.is_empty() && problem.projects.is_empty() {
        violations.push("At least one project is required to assign students".to_string());
    }

    for project in &problem.projects {
        if project.capacity_min > project.capacity_max {
            violations.push(format!(
                "Project {} has capacity_min ({}) > capacity_max ({})",
                project.id, project.capacity_min, project.capacity_max
            ));
        }
    }

    let student_ids: BTreeSet<StudentId> = problem.students.iter().map(|s| s.id).collect();
    let project_ids: BTreeSet<ProjectId> = problem.projects.iter().map(|p| p.id).collect();

    for student in &problem.students {
        for (&project, &score) in &student.preferences {
            if !project_ids.contains(&project) {
                violations.push(format!(
                    "Student {} has a preference for unknown project {}",
                    student.id, project
                ));
            }
            if !score.is_finite() {
                violations.push(format!(
                    "Student {} has a non-finite preference score for project {}",
                    student.id, project
                ));
            }
        }
        for &other in &student.incompatible_with {
            if other == student.id {
                violations.push(format!("Student {} is declared incompatible with itself", student.id));
            } else if !student_ids.contains(&other) {
                violations.push(format!(
                    "Student {} is declared incompatible with unknown student {}",
                    student.id, other
                ));
            }
        }
    }

    violations
}

pub fn build(problem: &AssignmentProblem) -> Result<BuiltModel<AssignmentKey>, ProblemError> {
    ProblemError::check(validate(problem))?;

    let mut built = BuiltModel::new(
        OptimizationProblem::new(ObjectiveFunction::maximize())
            .with_name("student_assignment")
            .with_description(format!(
                "{} students, {} projects",
                problem.students.len(),
                problem.projects.len()
            )),
    );

    let mut index = BTreeMap::new();
    for student in &problem.students {
        for project in &problem.projects {
            let var = built.add_variable(
                (student.id, project.id),
                Variable::binary(format!("x_{}_{}", student.id, project.id)),
                student.preference(project.id),
            );
            index.insert((student.id, project.id), var);
        }
    }

    for student in &problem.students {
        built.add_constraint(
            Constraint::eq(1.0)
                .with_name(format!("assign_{}", student.id))
                .with_terms(problem.projects.iter().map(|p| (index[&(student.id, p.id)], 1.0))),
        );
    }

    for project in &problem.projects {
        let members: Vec<(usize, f64)> = problem
            .students
            .iter()
            .map(|s| (index[&(s.id, project.id)], 1.0))
            .collect();
        if project.capacity_min > 0 {
            built.add_constraint(
                Constraint::ge(project.capacity_min as f64)
                    .with_name(format!("cap_min_{}", project.id))
                    .with_terms(members.iter().copied()),
            );
        }
        built.add_constraint(
            Constraint::le(project.capacity_max as f64)
                .with_name(format!("cap_max_{}", project.id))
                .with_terms(members),
        );
    }

    for (a, b) in problem.incompatible_pairs() {
        for project in &problem.projects {
            built.add_constraint(
                Constraint::le(1.0)
                    .with_name(format!("incomp_{}_{}_{}", a, b, project.id))
                    .with_term(index[&(a, project.id)], 1.0)
                    .with_term(index[&(b, project.id)], 1.0),
            );
        }
    }

    Ok(built)
}

/// Domain view of an assignment solution
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentMetrics {
    pub student_assignments: BTreeMap<StudentId, ProjectId>,
    /// Members per project, every project present, members in ascending id order
    pub project_members: BTreeMap<ProjectId, Vec<StudentId>>,
    pub unassigned: Vec<StudentId>,
    pub total_score: f64,
    pub constraints_satisfied: BTreeMap<String, bool>,
}

impl AssignmentMetrics {
    pub fn all_satisfied(&self) -> bool {
        self.constraints_satisfied.values().all(|&ok| ok)
    }
}

pub fn derive_metrics(
    problem: &AssignmentProblem,
    solution: &Solution<AssignmentKey>,
) -> Option<AssignmentMetrics> {
    if !solution.has_solution() {
        return None;
    }

    let mut student_assignments = BTreeMap::new();
    let mut project_members: BTreeMap<ProjectId, Vec<StudentId>> =
        problem.projects.iter().map(|p| (p.id, Vec::new())).collect();

    for (&(student, project), &value) in solution.values() {
        if value > 0.5 {
            student_assignments.insert(student, project);
            project_members.entry(project).or_default().push(student);
        }
    }

    let unassigned: Vec<StudentId> = problem
        .students
        .iter()
        .map(|s| s.id)
        .filter(|id| !student_assignments.contains_key(id))
        .collect();

    let total_score = problem
        .students
        .iter()
        .filter_map(|s| student_assignments.get(&s.id).map(|&p| s.preference(p)))
        .sum();

    let mut constraints_satisfied = BTreeMap::new();
    constraints_satisfied.insert("all_assigned".to_string(), unassigned.is_empty());
    for project in &problem.projects {
        let count = project_members.get(&project.id).map_or(0, Vec::len) as f64;
        constraints_satisfied.insert(
            format!("cap_min_{}", project.id),
            count >= project.capacity_min as f64 - TOLERANCE,
        );
        constraints_satisfied.insert(
            format!("cap_max_{}", project.id),
            count <= project.capacity_max as f64 + TOLERANCE,
        );
    }
    for (a, b) in problem.incompatible_pairs() {
        let together = matches!(
            (student_assignments.get(&a), student_assignments.get(&b)),
            (Some(pa), Some(pb)) if pa == pb
        );
        constraints_satisfied.insert(format!("incompatible_{}_{}", a, b), !together);
    }

    Some(AssignmentMetrics {
        student_assignments,
        project_members,
        unassigned,
        total_score,
        constraints_satisfied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConstraintType, OptimizationType, SolutionStatus, VariableType};

    fn demo() -> AssignmentProblem {
        AssignmentProblem::new(
            vec![
                Student::new(1, "Alice")
                    .with_preference(101, 10.0)
                    .with_preference(102, 3.0)
                    .with_incompatibility(2),
                Student::new(2, "Bob")
                    .with_preference(101, 5.0)
                    .with_preference(102, 8.0)
                    .with_incompatibility(1),
                Student::new(3, "Charlie").with_preference(101, 7.0),
            ],
            vec![
                Project::new(101, "Web", 1, 2),
                Project::new(102, "Mobile", 0, 2),
            ],
        )
    }

    #[test]
    fn valid_problem_has_no_violations() {
        assert!(validate(&demo()).is_empty());
    }

    #[test]
    fn validation_reports_every_defect() {
        let problem = AssignmentProblem::new(
            vec![
                Student::new(1, "A").with_preference(999, 1.0).with_incompatibility(1),
                Student::new(1, "A again").with_incompatibility(42),
            ],
            vec![Project::new(7, "P", 3, 2)],
        );
        let violations = validate(&problem);
        assert_eq!(violations.len(), 5, "{:?}", violations);
        assert!(violations[0].contains("Duplicate student id 1"));
        assert!(violations.iter().any(|v| v.contains("capacity_min (3) > capacity_max (2)")));
        assert!(violations.iter().any(|v| v.contains("unknown project 999")));
        assert!(violations.iter().any(|v| v.contains("incompatible with itself")));
        assert!(violations.iter().any(|v| v.contains("unknown student 42")));
    }

    #[test]
    fn students_without_projects_rejected() {
        let problem = AssignmentProblem::new(vec![Student::new(1, "A")], vec![]);
        assert_eq!(validate(&problem).len(), 1);
        assert!(matches!(build(&problem), Err(ProblemError::Invalid(_))));
    }

    #[test]
    fn build_creates_one_binary_per_pair() {
        let built = build(&demo()).unwrap();
        let model = built.model();

        assert_eq!(model.num_variables(), 6);
        assert_eq!(model.objective.optimization_type, OptimizationType::Maximize);
        assert!(model
            .variables
            .iter()
            .all(|v| v.variable_type == VariableType::Binary));
        assert_eq!(built.objective_coefficient(&(1, 101)), Some(10.0));
        // no declared preference scores zero
        assert_eq!(built.objective_coefficient(&(3, 102)), Some(0.0));
        assert_eq!(built.variable(&(2, 102)).unwrap().name, "x_2_102");
    }

    #[test]
    fn build_emits_assignment_capacity_and_incompatibility_rows() {
        let built = build(&demo()).unwrap();
        let model = built.model();

        let assign = model.constraint("assign_3").unwrap();
        assert_eq!(assign.constraint_type, ConstraintType::Equal);
        assert_eq!(assign.num_terms(), 2);

        let cap_min = model.constraint("cap_min_101").unwrap();
        assert_eq!(cap_min.constraint_type, ConstraintType::GreaterThanOrEqual);
        assert_eq!(cap_min.bound, 1.0);
        // capacity_min = 0 adds nothing
        assert!(model.constraint("cap_min_102").is_none());
        assert_eq!(model.constraint("cap_max_102").unwrap().bound, 2.0);

        // the symmetric pair 1-2 / 2-1 yields one row per project, not two
        let incompat: Vec<_> = model
            .constraints
            .iter()
            .filter(|c| c.name.starts_with("incomp_"))
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(incompat, vec!["incomp_1_2_101", "incomp_1_2_102"]);

        // 3 assign + 1 cap_min + 2 cap_max + 2 incompatibility
        assert_eq!(model.num_constraints(), 8);
    }

    #[test]
    fn metrics_flag_violations() {
        let mut values = BTreeMap::new();
        values.insert((1, 102), 1.0);
        values.insert((2, 102), 1.0);
        let solution = Solution::found(
            SolutionStatus::HeuristicPartial,
            11.0,
            values,
            Duration::ZERO,
            "partial",
        );

        let metrics = derive_metrics(&demo(), &solution).unwrap();
        assert_eq!(metrics.unassigned, vec![3]);
        assert_eq!(metrics.total_score, 11.0);
        assert_eq!(metrics.project_members[&102], vec![1, 2]);
        assert!(metrics.project_members[&101].is_empty());
        assert!(!metrics.constraints_satisfied["all_assigned"]);
        assert!(!metrics.constraints_satisfied["cap_min_101"]);
        assert!(metrics.constraints_satisfied["cap_max_102"]);
        assert!(!metrics.constraints_satisfied["incompatible_1_2"]);
        assert!(!metrics.all_satisfied());
    }

    #[test]
    fn no_metrics_without_solution() {
        let solution = Solution::without_values(SolutionStatus::Infeasible, Duration::ZERO, "no");
        assert!(derive_metrics(&demo(), &solution).is_none());
    }
}
