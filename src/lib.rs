pub mod core;

pub use crate::core::{
    config::{MAX_QUEUES, RegistryConfig, Verbosity},
    error::{QueueError, Result},
    queue::{LinkedQueue, QueueHandle},
    registry::{QueueRegistry, SweepReport},
};
