// Background solves on tokio's blocking pool

use crate::application::service::OptimizationService;
use crate::domain::Solution;
use crate::problems::{Outcome, ProblemError};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Runs solve jobs off the async executor, one blocking task per job
#[derive(Clone)]
pub struct SolveWorker {
    service: OptimizationService,
}

impl SolveWorker {
    pub fn new(service: OptimizationService) -> Self {
        Self { service }
    }

    /// Starts `job` on a blocking task. Must be called from within a tokio runtime.
    ///
    /// The job owns its problem snapshot; nothing is shared mutably with the caller.
    pub fn spawn<K, M, F>(&self, job: F) -> SolveHandle<K, M>
    where
        K: Ord + Send + 'static,
        M: Send + 'static,
        F: FnOnce(&OptimizationService) -> Result<Outcome<K, M>, ProblemError> + Send + 'static,
    {
        let service = self.service.clone();
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || job(&service));
        SolveHandle { task, started }
    }
}

/// Awaitable result of a background solve
pub struct SolveHandle<K: Ord, M> {
    task: JoinHandle<Result<Outcome<K, M>, ProblemError>>,
    started: Instant,
}

impl<K: Ord, M> SolveHandle<K, M> {
    /// Best effort: a job already inside the engine runs to completion
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the job. A cancelled or panicked job yields an `Error` solution.
    pub async fn join(self) -> Result<Outcome<K, M>, ProblemError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                let reason = if e.is_cancelled() {
                    "Solve was cancelled".to_string()
                } else {
                    format!("Solve task failed: {}", e)
                };
                tracing::warn!(event = "solve_aborted", %reason);
                Ok(Outcome {
                    solution: Solution::error(self.started.elapsed(), reason),
                    metrics: None,
                })
            }
        }
    }
}
