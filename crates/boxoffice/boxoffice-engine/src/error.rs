#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("simulation is already running")]
    AlreadyRunning,

    #[error("failed to spawn worker thread")]
    Spawn(#[from] std::io::Error),
}
