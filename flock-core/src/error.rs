use thiserror::Error;

/// Errors raised by the tick coordinator
#[derive(Error, Debug)]
pub enum TickError {
    /// The compute worker thread could not be started
    #[error("Failed to spawn compute worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The compute worker is gone and will never hand over another pass
    #[error("Compute worker stopped")]
    WorkerStopped,
}

/// Result type alias for tick operations
pub type Result<T> = std::result::Result<T, TickError>;
