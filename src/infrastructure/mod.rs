// Infrastructure layer: configuration files and log output

pub mod config;
pub mod logging;

pub use config::ConfigError;
pub use logging::init_tracing;
