// Domain module: canonical model, engine interface and the solution record

pub mod models;
pub mod solution;
pub mod solver_service;
pub mod value_objects;

pub use models::*;
pub use solution::*;
pub use solver_service::*;
pub use value_objects::*;
