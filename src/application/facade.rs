// Solving facade: one built model in, one domain solution out.
// Engine failures of any kind end up as an Error-status solution, never as a panic or Err.

use crate::domain::{
    EngineSolution, EngineStatus, OptimizationProblem, Sensitivity, Solution, SolutionStatus,
    SolverConfig, SolverService, VariableType,
};
use crate::problems::assignment::{self, AssignmentKey, AssignmentProblem, AssignmentSolver};
use crate::problems::{BuiltModel, ProblemError};
use crate::solver::SolverFactory;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Continuous and integer values at or below this magnitude are treated as zero
pub const VALUE_THRESHOLD: f64 = 1e-9;

/// Binary variables above this value count as selected
pub const BINARY_THRESHOLD: f64 = 0.5;

#[derive(Clone)]
pub struct SolvingFacade {
    engine: Option<Arc<dyn SolverService>>,
    config: SolverConfig,
}

impl SolvingFacade {
    pub fn new(engine: Arc<dyn SolverService>) -> Self {
        Self {
            engine: Some(engine),
            config: SolverConfig::default(),
        }
    }

    /// A facade without an engine: every solve reports `Error`
    pub fn unavailable() -> Self {
        Self {
            engine: None,
            config: SolverConfig::default(),
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            engine: SolverFactory::create(config.backend),
            config: config.clone(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_engine_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine.as_deref().map(|engine| engine.name())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve<K: Ord + Clone>(&self, built: BuiltModel<K>, time_limit: Option<Duration>) -> Solution<K> {
        let (mut model, keys) = built.into_parts();
        let mut config = self.config.clone();
        if let Some(limit) = time_limit {
            config = config.with_time_limit(limit);
        }
        model.solver_config = config;

        let start_time = Instant::now();
        let Some(engine) = self.engine.as_deref() else {
            return Solution::error(
                start_time.elapsed(),
                format!("No MILP engine is available to solve '{}'", model.name),
            );
        };

        if model.num_variables() == 0 {
            return Solution::found(
                SolutionStatus::Optimal,
                0.0,
                BTreeMap::new(),
                start_time.elapsed(),
                "Model has no decision variables",
            );
        }

        if model.is_mixed_integer() && !engine.supports_mip() {
            tracing::warn!(engine = engine.name(), model = %model.name, "engine cannot solve integer models");
            return Solution::error(
                start_time.elapsed(),
                format!(
                    "{} does not support integer variables required by '{}'",
                    engine.name(),
                    model.name
                ),
            );
        }

        tracing::info!(
            event = "solve_start",
            engine = engine.name(),
            model = %model.name,
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            integer = model.num_integer_variables(),
        );

        let result = catch_unwind(AssertUnwindSafe(|| engine.solve(&model)));
        let solve_time = start_time.elapsed();

        let solution = match result {
            Ok(Ok(answer)) => {
                let statistics = answer.statistics.clone();
                Self::interpret(&model, &keys, answer, solve_time).with_statistics(statistics)
            }
            Ok(Err(e)) => Solution::error(solve_time, e.to_string()),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Solution::error(solve_time, format!("{} panicked: {}", engine.name(), reason))
            }
        };

        tracing::info!(
            event = "solve_end",
            engine = engine.name(),
            model = %model.name,
            status = %solution.status(),
            objective = ?solution.objective_value(),
            solve_time_ms = solve_time.as_secs_f64() * 1000.0,
        );
        solution
    }

    fn interpret<K: Ord + Clone>(
        model: &OptimizationProblem,
        keys: &[K],
        answer: EngineSolution,
        solve_time: Duration,
    ) -> Solution<K> {
        let status = match answer.status {
            EngineStatus::Optimal => SolutionStatus::Optimal,
            EngineStatus::Infeasible => {
                return Solution::without_values(SolutionStatus::Infeasible, solve_time, answer.message)
            }
            EngineStatus::Unbounded => {
                return Solution::without_values(SolutionStatus::Unbounded, solve_time, answer.message)
            }
            EngineStatus::Other(description) => {
                return Solution::error(
                    solve_time,
                    format!("Engine stopped without a solution: {}", description),
                )
            }
        };

        let mut values = BTreeMap::new();
        for ((key, variable), &value) in keys.iter().zip(&model.variables).zip(&answer.variable_values) {
            match variable.variable_type {
                VariableType::Binary if value > BINARY_THRESHOLD => {
                    values.insert(key.clone(), 1.0);
                }
                VariableType::Binary => {}
                _ if value.abs() > VALUE_THRESHOLD => {
                    values.insert(key.clone(), value);
                }
                _ => {}
            }
        }

        let objective = answer
            .objective_value
            .unwrap_or_else(|| model.objective.evaluate(&answer.variable_values));
        let solution = Solution::found(status, objective, values, solve_time, answer.message);

        if model.solver_config.sensitivity {
            solution.with_sensitivity(sensitivity(model, &answer.dual_values, &answer.reduced_costs))
        } else {
            solution
        }
    }
}

fn sensitivity(
    model: &OptimizationProblem,
    duals: &[f64],
    reduced_costs: &[f64],
) -> Sensitivity {
    Sensitivity {
        shadow_prices: model
            .constraints
            .iter()
            .zip(duals)
            .map(|(c, &dual)| (c.name.clone(), dual))
            .collect(),
        reduced_costs: model
            .variables
            .iter()
            .zip(reduced_costs)
            .map(|(v, &cost)| (v.name.clone(), cost))
            .collect(),
    }
}

/// Assignment solving through the facade's engine
#[derive(Clone)]
pub struct EngineAssignmentSolver {
    facade: SolvingFacade,
}

impl EngineAssignmentSolver {
    pub fn new(facade: SolvingFacade) -> Self {
        Self { facade }
    }
}

impl AssignmentSolver for EngineAssignmentSolver {
    fn solve(
        &self,
        problem: &AssignmentProblem,
        time_limit: Option<Duration>,
    ) -> Result<Solution<AssignmentKey>, ProblemError> {
        let built = assignment::build(problem)?;
        Ok(self.facade.solve(built, time_limit))
    }

    fn name(&self) -> &str {
        self.facade.engine_name().unwrap_or("unavailable")
    }
}
