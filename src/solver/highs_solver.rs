// HiGHS Solver Adapter
// Translates the canonical model into a HiGHS RowProblem and the answer back

use crate::domain::{
    models::{EngineSolution, OptimizationProblem, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, EngineStatus, OptimizationType, VariableType},
};
use highs::{HighsModelStatus, Model, RowProblem, Sense};
use std::time::Instant;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }

    fn model(problem: &OptimizationProblem, presolve: bool) -> Model {
        let mut pb = RowProblem::default();

        let cols: Vec<_> = problem
            .variables
            .iter()
            .zip(&problem.objective.coefficients)
            .map(|(var_def, &obj_coeff)| {
                let lower = var_def.lower_bound;
                let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
                match var_def.variable_type {
                    VariableType::Integer | VariableType::Binary => {
                        pb.add_integer_column(obj_coeff, lower..=upper)
                    }
                    VariableType::Continuous => pb.add_column(obj_coeff, lower..=upper),
                }
            })
            .collect();

        for constraint in &problem.constraints {
            let terms: Vec<_> = constraint
                .terms
                .iter()
                .map(|&(i, coeff)| (cols[i], coeff))
                .collect();
            let b = constraint.bound;
            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=b, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(b..=b, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(b.., &terms);
                }
            }
        }

        let sense = match problem.objective.optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let config = &problem.solver_config;
        let mut model = pb.optimise(sense);
        model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit() {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }
        if !presolve {
            model.set_option("presolve", "off");
        }
        model
    }

    fn run(problem: &OptimizationProblem, presolve: bool) -> Result<(HighsModelStatus, highs::SolvedModel)> {
        let solved = Self::model(problem, presolve).try_solve().map_err(|status| {
            SolverError::ExecutionFailed(format!("HiGHS failed to run: {:?}", status))
        })?;
        Ok((solved.status(), solved))
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<EngineSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();
        let (mut status, mut solved) = Self::run(problem, true)?;

        // Presolve cannot tell these apart; the simplex run without it can
        if status == HighsModelStatus::UnboundedOrInfeasible {
            tracing::debug!(problem = %problem.name, "re-solving without presolve");
            (status, solved) = Self::run(problem, false)?;
        }
        let statistics = SolverStatistics::for_problem(problem, start_time.elapsed());

        let solution = match status {
            HighsModelStatus::Optimal => {
                let solution_data = solved.get_solution();
                let variable_values = solution_data.columns().to_vec();
                let objective = problem.objective.evaluate(&variable_values);

                let mut solution = EngineSolution::optimal(objective, variable_values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                if problem.solver_config.sensitivity && !problem.is_mixed_integer() {
                    solution = solution.with_sensitivity(
                        solution_data.dual_rows().to_vec(),
                        solution_data.dual_columns().to_vec(),
                    );
                }
                solution
            }
            HighsModelStatus::Infeasible => EngineSolution::new(
                EngineStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            HighsModelStatus::Unbounded => EngineSolution::new(
                EngineStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            HighsModelStatus::ReachedTimeLimit => EngineSolution::new(
                EngineStatus::Other("time limit reached".to_string()),
                "HiGHS stopped at the time limit before proving optimality",
            ),
            other => EngineSolution::new(
                EngineStatus::Other(format!("{:?}", other)),
                format!("HiGHS returned status {:?}", other),
            ),
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
