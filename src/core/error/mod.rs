use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueueError>;

/// Failures surfaced by queue and registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("cannot create more than {capacity} queues")]
    CapacityExceeded { capacity: usize },

    #[error("node allocation failed for queue {index}")]
    AllocationFailure { index: usize },

    #[error("queue {index} is empty")]
    EmptyQueue { index: usize },

    #[error("value {value} not found in queue")]
    NotFound { value: i32 },

    #[error("queue handle has been released")]
    NullHandle,

    #[error("invalid registry config: {0}")]
    InvalidConfig(String),
}
