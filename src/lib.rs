pub mod config;
pub mod scheduler;
pub mod simulation;

pub use config::*;
pub use scheduler::*;
pub use simulation::*;
