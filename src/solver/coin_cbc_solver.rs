// COIN-OR CBC Solver Adapter (through good_lp)

use crate::domain::{
    models::{EngineSolution, OptimizationProblem, SolverStatistics},
    solver_service::{Result, SolverService},
    value_objects::{ConstraintType, EngineStatus, OptimizationType, VariableType},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolutionStatus as GoodLpStatus, SolverModel,
    Variable as GoodLpVariable, WithTimeLimit,
};
use std::time::Instant;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<EngineSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();

        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> = problem
            .variables
            .iter()
            .map(|var_def| {
                let lower = var_def.lower_bound;
                let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
                match var_def.variable_type {
                    VariableType::Binary => vars.add(variable().binary()),
                    VariableType::Integer => vars.add(variable().integer().min(lower).max(upper)),
                    VariableType::Continuous => vars.add(variable().min(lower).max(upper)),
                }
            })
            .collect();

        let mut objective = Expression::default();
        for (&var, &coeff) in lp_variables.iter().zip(&problem.objective.coefficients) {
            if coeff != 0.0 {
                objective.add_mul(coeff, var);
            }
        }

        let mut lp_model = match problem.objective.optimization_type {
            OptimizationType::Maximize => vars.maximise(objective),
            OptimizationType::Minimize => vars.minimise(objective),
        }
        .using(coin_cbc::coin_cbc);

        let config = &problem.solver_config;
        lp_model.set_parameter("log", if config.verbose { "1" } else { "0" });
        if let Some(limit) = config.time_limit() {
            lp_model = lp_model.with_time_limit(limit.as_secs_f64());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }

        for constraint in &problem.constraints {
            let mut lhs = Expression::default();
            for &(i, coeff) in &constraint.terms {
                lhs.add_mul(coeff, lp_variables[i]);
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        let solution_result = lp_model.solve();
        let statistics = SolverStatistics::for_problem(problem, start_time.elapsed());

        // CBC through good_lp exposes no duals, so sensitivity is never reported
        let solution = match solution_result {
            // An incumbent cut off by the time limit is not proven optimal
            Ok(sol) if matches!(sol.status(), GoodLpStatus::TimeLimit) => EngineSolution::new(
                EngineStatus::Other("time limit reached".to_string()),
                "CBC stopped at the time limit before proving optimality",
            ),
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective = problem.objective.evaluate(&variable_values);

                let mut solution = EngineSolution::optimal(objective, variable_values);
                solution.message = match sol.status() {
                    GoodLpStatus::GapLimit => format!(
                        "Solution for '{}' within the configured gap tolerance",
                        problem.name
                    ),
                    _ => format!("Optimal solution found for '{}'", problem.name),
                };
                solution
            }
            Err(ResolutionError::Infeasible) => EngineSolution::new(
                EngineStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => EngineSolution::new(
                EngineStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            Err(e) => EngineSolution::new(
                EngineStatus::Other(e.to_string()),
                format!("CBC failed: {}", e),
            ),
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
