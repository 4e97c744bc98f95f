use std::collections::BTreeMap;
use std::time::Duration;

use super::models::SolverStatistics;
use super::value_objects::SolutionStatus;

/// Shadow prices and reduced costs reported for an optimal LP solution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sensitivity {
    /// Dual value per constraint name
    pub shadow_prices: BTreeMap<String, f64>,
    /// Reduced cost per variable name
    pub reduced_costs: BTreeMap<String, f64>,
}

impl Sensitivity {
    pub fn is_empty(&self) -> bool {
        self.shadow_prices.is_empty() && self.reduced_costs.is_empty()
    }
}

/// Outcome of exactly one solve attempt, keyed by the decision-variable keys of one model.
///
/// Fields are private: a solution is read-only once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<K: Ord> {
    status: SolutionStatus,
    objective_value: Option<f64>,
    values: BTreeMap<K, f64>,
    solve_time: Duration,
    message: String,
    sensitivity: Option<Sensitivity>,
    statistics: Option<SolverStatistics>,
}

impl<K: Ord> Solution<K> {
    /// A solution with values; the objective is kept only if the status denotes a found solution
    pub(crate) fn found(
        status: SolutionStatus,
        objective_value: f64,
        values: BTreeMap<K, f64>,
        solve_time: Duration,
        message: impl Into<String>,
    ) -> Self {
        let has_solution = status.has_solution();
        Self {
            status,
            objective_value: has_solution.then_some(objective_value),
            values: if has_solution { values } else { BTreeMap::new() },
            solve_time,
            message: message.into(),
            sensitivity: None,
            statistics: None,
        }
    }

    /// A solution without values (infeasible, unbounded, error)
    pub(crate) fn without_values(
        status: SolutionStatus,
        solve_time: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            objective_value: None,
            values: BTreeMap::new(),
            solve_time,
            message: message.into(),
            sensitivity: None,
            statistics: None,
        }
    }

    pub(crate) fn error(solve_time: Duration, message: impl Into<String>) -> Self {
        Self::without_values(SolutionStatus::Error, solve_time, message)
    }

    pub(crate) fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        if !sensitivity.is_empty() {
            self.sensitivity = Some(sensitivity);
        }
        self
    }

    pub(crate) fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn status(&self) -> SolutionStatus {
        self.status
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    pub fn values(&self) -> &BTreeMap<K, f64> {
        &self.values
    }

    /// Resolved quantity for `key`; keys absent from the map resolved to zero
    pub fn value(&self, key: &K) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn sensitivity(&self) -> Option<&Sensitivity> {
        self.sensitivity.as_ref()
    }

    /// Model size and engine time, present when an engine ran
    pub fn statistics(&self) -> Option<&SolverStatistics> {
        self.statistics.as_ref()
    }

    pub fn has_solution(&self) -> bool {
        self.status.has_solution()
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
