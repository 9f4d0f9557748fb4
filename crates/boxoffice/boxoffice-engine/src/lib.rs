mod controller;
mod error;
mod sampler;
mod summary;

pub use controller::SimulationController;
pub use error::SimulationError;
pub use summary::RunSummary;
