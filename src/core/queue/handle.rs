use std::cell::RefCell;
use std::rc::{Rc, Weak};
use crate::core::error::{QueueError, Result};
use crate::core::log::{QueueOp, Tracer};
use crate::core::queue::LinkedQueue;
use crate::core::registry::RegistryState;

/// Queue storage shared between a handle and its registry slot.
/// `None` once the shutdown sweep has released the queue.
pub(crate) type SharedQueue = Rc<RefCell<Option<LinkedQueue>>>;

/// Caller-facing reference to a registered queue
#[derive(Clone, Debug)]
pub struct QueueHandle {
    index: usize,
    queue: SharedQueue,
    registry: Weak<RefCell<RegistryState>>,
    tracer: Tracer,
}

impl QueueHandle {
    pub(crate) fn new(
        queue: LinkedQueue,
        registry: Weak<RefCell<RegistryState>>,
        tracer: Tracer,
    ) -> Self {
        Self {
            index: queue.index(),
            queue: Rc::new(RefCell::new(Some(queue))),
            registry,
            tracer,
        }
    }

    pub(crate) fn shared(&self) -> &SharedQueue {
        &self.queue
    }

    /// Registry slot this queue was assigned
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the shutdown sweep has released this queue
    pub fn is_released(&self) -> bool {
        self.queue.borrow().is_none()
    }

    /// Append `value` at the tail. The first node also (re)registers the
    /// queue in its registry slot.
    pub fn push(&self, value: i32) -> Result<()> {
        let first_node = self.with_queue(QueueOp::Push, |queue| {
            let first_node = queue.is_empty();
            queue.push(value)?;
            Ok(first_node)
        })?;
        if first_node {
            if let Some(registry) = self.registry.upgrade() {
                registry.borrow_mut().register(self.index, &self.queue);
            }
        }
        Ok(())
    }

    pub fn pop(&self) -> Result<i32> {
        self.with_queue(QueueOp::Pop, LinkedQueue::pop)
    }

    pub fn peek(&self) -> Result<i32> {
        self.with_queue(QueueOp::Peek, |queue| queue.peek())
    }

    /// 1-based position of the first node holding `value`
    pub fn search(&self, value: i32) -> Result<usize> {
        self.with_queue(QueueOp::Search, |queue| queue.search(value))
    }

    /// Live node count; 0 for a released queue
    pub fn size(&self) -> usize {
        self.queue.borrow().as_ref().map_or(0, LinkedQueue::size)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().as_ref().is_none_or(LinkedQueue::is_empty)
    }

    /// Release every node. Idempotent, and the queue may be pushed to again.
    pub fn free(&self) {
        match self.queue.borrow_mut().as_mut() {
            Some(queue) => queue.free(),
            None => self.tracer.notice(
                QueueOp::Free,
                format_args!("queue {} is already released, skipping free", self.index),
            ),
        }
    }

    pub fn debug_dump(&self) -> String {
        match self.queue.borrow().as_ref() {
            Some(queue) => queue.debug_dump(),
            None => format!("QUEUE {} is released.", self.index),
        }
    }

    fn with_queue<R>(
        &self,
        op: QueueOp,
        f: impl FnOnce(&mut LinkedQueue) -> Result<R>,
    ) -> Result<R> {
        let mut slot = self.queue.borrow_mut();
        match slot.as_mut() {
            Some(queue) => f(queue),
            None => {
                self.tracer.error(
                    op,
                    format_args!("attempt to {} on released queue {}", op, self.index),
                );
                Err(QueueError::NullHandle)
            }
        }
    }
}

/// Size of a possibly absent queue
pub fn size(handle: Option<&QueueHandle>) -> usize {
    handle.map_or(0, QueueHandle::size)
}

/// An absent queue counts as empty
pub fn is_empty(handle: Option<&QueueHandle>) -> bool {
    handle.is_none_or(QueueHandle::is_empty)
}
