use std::fmt::{self, Display, Formatter};
use crate::core::config::Verbosity;
use crate::core::queue::LinkedQueue;

/// Operation a trace line is about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOp {
    Create,
    Push,
    Pop,
    Peek,
    Search,
    Free,
    Sweep,
}

impl Display for QueueOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueOp::Create => "create",
            QueueOp::Push => "push",
            QueueOp::Pop => "pop",
            QueueOp::Peek => "peek",
            QueueOp::Search => "search",
            QueueOp::Free => "free",
            QueueOp::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// Verbosity-gated front end over `tracing`.
///
/// Structural errors and the sweep summary are always emitted; everything
/// else only when the tracer is verbose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tracer {
    verbosity: Verbosity,
}

impl Tracer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Log the queue layout after a mutating operation
    pub fn state(&self, op: QueueOp, value: i32, queue: &LinkedQueue) {
        if self.verbosity.is_verbose() {
            tracing::debug!(
                op = %op,
                index = queue.index(),
                size = queue.size(),
                "{} {}: {}",
                op,
                value,
                queue
            );
        }
    }

    /// Log a pop/peek attempt against an empty queue
    pub fn empty(&self, op: QueueOp, index: usize) {
        if self.verbosity.is_verbose() {
            tracing::warn!(op = %op, index, "attempt to {} an empty queue {}", op, index);
        }
    }

    pub fn debug(&self, op: QueueOp, message: fmt::Arguments<'_>) {
        if self.verbosity.is_verbose() {
            tracing::debug!(op = %op, "{}", message);
        }
    }

    pub fn info(&self, op: QueueOp, message: fmt::Arguments<'_>) {
        if self.verbosity.is_verbose() {
            tracing::info!(op = %op, "{}", message);
        }
    }

    /// Emitted regardless of verbosity
    pub fn notice(&self, op: QueueOp, message: fmt::Arguments<'_>) {
        tracing::info!(op = %op, "{}", message);
    }

    /// Structural error, emitted regardless of verbosity
    pub fn error(&self, op: QueueOp, message: fmt::Arguments<'_>) {
        tracing::error!(op = %op, "{}", message);
    }
}
