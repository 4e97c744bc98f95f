use crate::domain::{solver_service::SolverService, value_objects::SolverBackend};
use std::sync::Arc;

/// Factory for engine instances, limited to the engines compiled into this build
pub struct SolverFactory;

impl SolverFactory {
    /// Engine for the configured backend, `None` when it is `Greedy` or not compiled in
    pub fn create(backend: SolverBackend) -> Option<Arc<dyn SolverService>> {
        let engine = match backend {
            SolverBackend::Auto => Self::highs().or_else(Self::coin_cbc),
            SolverBackend::Highs => Self::highs(),
            SolverBackend::CoinCbc => Self::coin_cbc(),
            SolverBackend::Greedy => return None,
        };
        if engine.is_none() {
            tracing::warn!(backend = %backend, "requested engine is not compiled into this build");
        }
        engine
    }

    /// Engine backends compiled into this build, preferred first
    pub fn available_backends() -> Vec<SolverBackend> {
        let mut backends = Vec::new();
        if cfg!(feature = "highs") {
            backends.push(SolverBackend::Highs);
        }
        if cfg!(feature = "coin_cbc") {
            backends.push(SolverBackend::CoinCbc);
        }
        backends
    }

    #[cfg(feature = "highs")]
    fn highs() -> Option<Arc<dyn SolverService>> {
        Some(Arc::new(crate::solver::HighsSolver::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs() -> Option<Arc<dyn SolverService>> {
        None
    }

    #[cfg(feature = "coin_cbc")]
    fn coin_cbc() -> Option<Arc<dyn SolverService>> {
        Some(Arc::new(crate::solver::CoinCbcSolver::new()))
    }

    #[cfg(not(feature = "coin_cbc"))]
    fn coin_cbc() -> Option<Arc<dyn SolverService>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_backend_has_no_engine() {
        assert!(SolverFactory::create(SolverBackend::Greedy).is_none());
    }

    #[test]
    fn auto_matches_compiled_engines() {
        let engine = SolverFactory::create(SolverBackend::Auto);
        assert_eq!(engine.is_some(), !SolverFactory::available_backends().is_empty());
    }

    #[cfg(feature = "highs")]
    #[test]
    fn auto_prefers_highs() {
        let engine = SolverFactory::create(SolverBackend::Auto).unwrap();
        assert_eq!(engine.name(), "HiGHS");
    }

    #[cfg(not(feature = "coin_cbc"))]
    #[test]
    fn missing_engine_yields_none() {
        assert!(SolverFactory::create(SolverBackend::CoinCbc).is_none());
    }
}
