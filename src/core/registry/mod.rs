use std::cell::RefCell;
use std::rc::{Rc, Weak};
use crate::core::config::{RegistryConfig, Verbosity};
use crate::core::error::{QueueError, Result};
use crate::core::log::{QueueOp, Tracer};
use crate::core::queue::{LinkedQueue, QueueHandle, SharedQueue};

/// Outcome of the shutdown sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub queues_released: usize,   // queues that still held nodes
    pub nodes_released: usize,
    pub slots_cleared: usize,
}

/// Slot table shared with every handle the registry issued
#[derive(Debug)]
pub(crate) struct RegistryState {
    slots: Box<[Option<Weak<RefCell<Option<LinkedQueue>>>>]>,
    next_index: usize,
    swept: bool,
}

impl RegistryState {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            next_index: 0,
            swept: false,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Hand out the next unused index without storing anything yet
    fn reserve_slot(&mut self) -> Result<usize> {
        if self.next_index >= self.capacity() {
            return Err(QueueError::CapacityExceeded { capacity: self.capacity() });
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(index)
    }

    /// Point `slots[index]` at `queue`. Registering the same queue twice is harmless.
    pub(crate) fn register(&mut self, index: usize, queue: &SharedQueue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(Rc::downgrade(queue));
        }
    }

    fn live_slot(&self, index: usize) -> Option<SharedQueue> {
        self.slots.get(index)?.as_ref()?.upgrade()
    }

    /// Release every queue still holding nodes, detach it from its handles
    /// and clear its slot. Runs once; later calls report nothing.
    fn shutdown_all(&mut self, tracer: Tracer) -> SweepReport {
        if self.swept {
            return SweepReport::default();
        }
        self.swept = true;
        tracer.debug(
            QueueOp::Sweep,
            format_args!("starting sweep over {} reserved slots", self.next_index),
        );

        let mut report = SweepReport::default();
        for slot in self.slots.iter_mut().take(self.next_index) {
            let Some(weak) = slot.take() else {
                continue;
            };
            report.slots_cleared += 1;
            let Some(shared) = weak.upgrade() else {
                // every handle was dropped, so its nodes went with it
                continue;
            };
            if let Some(mut queue) = shared.borrow_mut().take() {
                if !queue.is_empty() {
                    report.nodes_released += queue.release_all();
                    report.queues_released += 1;
                }
            }
        }
        self.next_index = 0;

        tracer.notice(QueueOp::Sweep, format_args!("all queues have been freed"));
        report
    }
}

/// Owner of every queue slot in the application.
///
/// Construct one at startup and keep it alive for the life of the
/// application. Dropping it (or calling [`QueueRegistry::close`]) sweeps all
/// queues that were never freed; handles outliving the registry report
/// [`QueueError::NullHandle`] afterwards.
#[derive(Debug)]
pub struct QueueRegistry {
    state: Rc<RefCell<RegistryState>>,
    tracer: Tracer,
}

impl QueueRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(&config))
    }

    fn from_validated(config: &RegistryConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState::new(config.capacity))),
            tracer: Tracer::new(config.verbosity),
        }
    }

    /// Run `main` against a fresh registry and sweep it afterwards
    pub fn scope<R>(
        config: RegistryConfig,
        main: impl FnOnce(&QueueRegistry) -> R,
    ) -> Result<(R, SweepReport)> {
        let registry = Self::new(config)?;
        let output = main(&registry);
        Ok((output, registry.close()))
    }

    /// Create an empty queue in the next free slot
    pub fn create(&self) -> Result<QueueHandle> {
        let mut state = self.state.borrow_mut();
        let index = match state.reserve_slot() {
            Ok(index) => index,
            Err(e) => {
                self.tracer.error(QueueOp::Create, format_args!("{}", e));
                return Err(e);
            }
        };
        let queue = LinkedQueue::new(index, self.tracer.verbosity());
        let handle = QueueHandle::new(queue, Rc::downgrade(&self.state), self.tracer);
        state.register(index, handle.shared());

        self.tracer.info(
            QueueOp::Create,
            format_args!("queue initialized with index {}", index),
        );
        Ok(handle)
    }

    pub fn capacity(&self) -> usize {
        self.state.borrow().capacity()
    }

    /// Index the next `create` will assign
    pub fn next_index(&self) -> usize {
        self.state.borrow().next_index
    }

    pub fn verbosity(&self) -> Verbosity {
        self.tracer.verbosity()
    }

    /// Whether `index` refers to a queue that is still reachable
    pub fn is_registered(&self, index: usize) -> bool {
        self.state.borrow().live_slot(index).is_some_and(|q| q.borrow().is_some())
    }

    /// Number of registered queues still reachable through a handle
    pub fn live_queues(&self) -> usize {
        let state = self.state.borrow();
        (0..state.next_index)
            .filter_map(|index| state.live_slot(index))
            .filter(|queue| queue.borrow().is_some())
            .count()
    }

    /// Sweep every queue and consume the registry
    pub fn close(mut self) -> SweepReport {
        self.sweep()
    }

    fn sweep(&mut self) -> SweepReport {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.shutdown_all(self.tracer),
            Err(_) => {
                self.tracer.error(
                    QueueOp::Sweep,
                    format_args!("registry is borrowed, sweep skipped"),
                );
                SweepReport::default()
            }
        }
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::from_validated(&RegistryConfig::default())
    }
}

impl Drop for QueueRegistry {
    fn drop(&mut self) {
        self.sweep();
    }
}
