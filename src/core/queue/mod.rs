use std::fmt::{self, Display, Formatter};
use crate::core::config::Verbosity;
use crate::core::error::{QueueError, Result};
use crate::core::log::{QueueOp, Tracer};

mod handle;

pub use handle::{QueueHandle, is_empty, size};
pub(crate) use handle::SharedQueue;

/// Position of a node inside its queue's arena
type NodeId = usize;

/// One stored value
#[derive(Clone, Debug)]
struct Node {
    value: i32,
    next: Option<NodeId>,
    previous: Option<NodeId>,   // back link, never owning
}

#[derive(Clone, Debug)]
enum Slot {
    Occupied(Node),
    Vacant { next_free: Option<NodeId> },
}

/// FIFO queue over a doubly linked list.
///
/// Nodes live in an arena owned by the queue and are linked by arena
/// position, so `next`/`previous` can never dangle. Slots vacated by `pop`
/// are reused by later pushes; `free` hands the whole arena back.
#[derive(Clone, Debug)]
pub struct LinkedQueue {
    slots: Vec<Slot>,
    free_slots: Option<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    size: usize,
    index: usize,
    tracer: Tracer,
}

impl LinkedQueue {
    /// Create an empty queue identified by `index`
    pub fn new(index: usize, verbosity: Verbosity) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: None,
            head: None,
            tail: None,
            size: 0,
            index,
            tracer: Tracer::new(verbosity),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of live nodes, O(1)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Append `value` at the tail
    pub fn push(&mut self, value: i32) -> Result<()> {
        let size_before = self.size;
        let id = self.allocate(value)?;
        match self.tail {
            None => {
                // first node: sole head and tail
                self.head = Some(id);
                self.size = 1;
            }
            Some(old_tail) => {
                self.node_mut(old_tail).next = Some(id);
                self.size += 1;
            }
        }
        self.tail = Some(id);

        // --post operation assertion
        assert_eq!(self.size, size_before + 1, "Queue size must grow by one after push");
        self.tracer.state(QueueOp::Push, value, self);
        Ok(())
    }

    /// Remove and return the head value
    pub fn pop(&mut self) -> Result<i32> {
        let Some(head) = self.head else {
            self.tracer.empty(QueueOp::Pop, self.index);
            return Err(QueueError::EmptyQueue { index: self.index });
        };
        let size_before = self.size;
        let node = self.release(head);
        match node.next {
            None => {
                self.head = None;
                self.tail = None;
                self.slots.clear();
                self.free_slots = None;
            }
            Some(next) => {
                self.node_mut(next).previous = None;
                self.head = Some(next);
            }
        }
        self.size -= 1;

        // -- post op assertion: size shrinks by exactly one
        assert_eq!(self.size, size_before - 1, "Queue size must shrink by one after pop");
        self.tracer.state(QueueOp::Pop, node.value, self);
        Ok(node.value)
    }

    /// Head value without removing it
    pub fn peek(&self) -> Result<i32> {
        match self.head {
            Some(head) => Ok(self.node(head).value),
            None => {
                self.tracer.empty(QueueOp::Peek, self.index);
                Err(QueueError::EmptyQueue { index: self.index })
            }
        }
    }

    /// 1-based position of the first node holding `value`
    pub fn search(&self, value: i32) -> Result<usize> {
        if self.is_empty() {
            self.tracer.debug(
                QueueOp::Search,
                format_args!("queue {} is empty, cannot search for {}", self.index, value),
            );
            return Err(QueueError::NotFound { value });
        }
        match self.iter().position(|v| v == value) {
            Some(offset) => {
                let position = offset + 1;
                self.tracer.debug(
                    QueueOp::Search,
                    format_args!("value {} found at position {}", value, position),
                );
                Ok(position)
            }
            None => {
                self.tracer.debug(
                    QueueOp::Search,
                    format_args!(
                        "value {} not found after traversing {} elements",
                        value, self.size
                    ),
                );
                Err(QueueError::NotFound { value })
            }
        }
    }

    /// Release every node. A no-op on an empty queue.
    pub fn free(&mut self) {
        self.release_all();
    }

    /// Release every node and report how many there were
    pub(crate) fn release_all(&mut self) -> usize {
        if self.head.is_none() {
            self.tracer.notice(
                QueueOp::Free,
                format_args!("queue {} is already empty, skipping free", self.index),
            );
            return 0;
        }
        self.tracer.debug(QueueOp::Free, format_args!("freeing queue {}", self.index));

        let released = self.size;
        self.slots = Vec::new();
        self.free_slots = None;
        self.head = None;
        self.tail = None;
        self.size = 0;

        self.tracer.debug(
            QueueOp::Free,
            format_args!("all {} nodes in queue {} have been freed", released, self.index),
        );
        released
    }

    /// Human-readable rendering of the chain, head to tail
    pub fn debug_dump(&self) -> String {
        self.to_string()
    }

    /// Values from head to tail; iterate backwards to walk the `previous` links
    pub fn iter(&self) -> Iter<'_> {
        Iter { queue: self, front: self.head, back: self.tail, remaining: self.size }
    }

    fn node(&self, id: NodeId) -> &Node {
        match &self.slots[id] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("queue {} links vacant slot {}", self.index, id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let index = self.index;
        match &mut self.slots[id] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("queue {} links vacant slot {}", index, id),
        }
    }

    /// Store a new tail node, reusing a vacated slot when one exists
    fn allocate(&mut self, value: i32) -> Result<NodeId> {
        let node = Node { value, next: None, previous: self.tail };
        if let Some(id) = self.free_slots {
            let Slot::Vacant { next_free } = self.slots[id] else {
                unreachable!("free list of queue {} points at occupied slot {}", self.index, id)
            };
            self.free_slots = next_free;
            self.slots[id] = Slot::Occupied(node);
            return Ok(id);
        }
        self.slots
            .try_reserve(1)
            .map_err(|_| QueueError::AllocationFailure { index: self.index })?;
        self.slots.push(Slot::Occupied(node));
        Ok(self.slots.len() - 1)
    }

    /// Vacate a slot and hand back its node
    fn release(&mut self, id: NodeId) -> Node {
        let vacant = Slot::Vacant { next_free: self.free_slots };
        match std::mem::replace(&mut self.slots[id], vacant) {
            Slot::Occupied(node) => {
                self.free_slots = Some(id);
                node
            }
            Slot::Vacant { .. } => unreachable!("queue {} released vacant slot {}", self.index, id),
        }
    }
}

impl Display for LinkedQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Some(head) = self.head else {
            return f.write_str("QUEUE is empty.");
        };
        write!(f, "[QUEUE {}]  --->  ", self.index)?;
        if self.head == self.tail {
            return write!(f, "(HEAD) [ {} ] (TAIL)", self.node(head).value);
        }
        let last = self.size - 1;
        for (position, value) in self.iter().enumerate() {
            if position == 0 {
                write!(f, "(HEAD) [ {} ] ---> ", value)?;
            } else if position == last {
                write!(f, "[ {} ] (TAIL)", value)?;
            } else {
                write!(f, "[ {} ] ---> ", value)?;
            }
        }
        Ok(())
    }
}

/// Double-ended iterator over queue values
pub struct Iter<'a> {
    queue: &'a LinkedQueue,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.queue.node(self.front?);
        self.front = node.next;
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<i32> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.queue.node(self.back?);
        self.back = node.previous;
        self.remaining -= 1;
        Some(node.value)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a LinkedQueue {
    type Item = i32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log::capture::RecordingSubscriber;
    use tracing::Level;
    use tracing::subscriber::with_default;

    fn queue() -> LinkedQueue {
        LinkedQueue::new(0, Verbosity::Quiet)
    }

    /// Walk both directions and check every link agrees with the counters
    fn assert_links(queue: &LinkedQueue) {
        assert_eq!(queue.head.is_none(), queue.tail.is_none());
        assert_eq!(queue.head.is_none(), queue.size == 0);

        let mut forward = Vec::new();
        let mut cursor = queue.head;
        let mut previous = None;
        while let Some(id) = cursor {
            let node = queue.node(id);
            assert_eq!(node.previous, previous, "previous link out of sync at slot {id}");
            forward.push(node.value);
            previous = Some(id);
            cursor = node.next;
        }
        assert_eq!(previous, queue.tail);
        assert_eq!(forward.len(), queue.size);

        let mut backward: Vec<i32> = queue.iter().rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn push_links_nodes_in_both_directions() {
        let mut q = queue();
        for v in [3, 1, 4, 1, 5] {
            q.push(v).unwrap();
            assert_links(&q);
        }
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![3, 1, 4, 1, 5]);
        assert_eq!(q.iter().rev().collect::<Vec<_>>(), vec![5, 1, 4, 1, 3]);
    }

    #[test]
    fn pop_clears_previous_of_new_head() {
        let mut q = queue();
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.push(3).unwrap();
        assert_eq!(q.pop(), Ok(1));
        let head = q.head.unwrap();
        assert_eq!(q.node(head).previous, None);
        assert_links(&q);
    }

    #[test]
    fn popped_slots_are_reused() {
        let mut q = queue();
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Ok(1));
        q.push(3).unwrap();
        assert_eq!(q.slots.len(), 2);
        assert_links(&q);
        assert_eq!(q.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn draining_resets_the_arena() {
        let mut q = queue();
        q.push(7).unwrap();
        q.push(8).unwrap();
        assert_eq!(q.pop(), Ok(7));
        assert_eq!(q.pop(), Ok(8));
        assert!(q.slots.is_empty());
        assert_eq!(q.free_slots, None);
        assert_eq!(q.pop(), Err(QueueError::EmptyQueue { index: 0 }));
        assert_links(&q);
    }

    #[test]
    fn negative_one_is_an_ordinary_value() {
        let mut q = queue();
        q.push(-1).unwrap();
        assert_eq!(q.peek(), Ok(-1));
        assert_eq!(q.pop(), Ok(-1));
        assert!(q.pop().is_err());
    }

    #[test]
    fn search_distinguishes_empty_and_missing() {
        let mut q = queue();
        assert_eq!(q.search(5), Err(QueueError::NotFound { value: 5 }));
        q.push(5).unwrap();
        q.push(6).unwrap();
        q.push(5).unwrap();
        assert_eq!(q.search(5), Ok(1));
        assert_eq!(q.search(6), Ok(2));
        assert_eq!(q.search(9), Err(QueueError::NotFound { value: 9 }));
    }

    #[test]
    fn release_all_reports_node_count_once() {
        let mut q = queue();
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.release_all(), 2);
        assert_eq!(q.release_all(), 0);
        assert_links(&q);
    }

    #[test]
    fn dump_marks_head_and_tail() {
        let mut q = LinkedQueue::new(3, Verbosity::Quiet);
        assert_eq!(q.debug_dump(), "QUEUE is empty.");
        q.push(10).unwrap();
        assert_eq!(q.debug_dump(), "[QUEUE 3]  --->  (HEAD) [ 10 ] (TAIL)");
        q.push(20).unwrap();
        q.push(30).unwrap();
        assert_eq!(
            q.debug_dump(),
            "[QUEUE 3]  --->  (HEAD) [ 10 ] ---> [ 20 ] ---> [ 30 ] (TAIL)"
        );
    }

    #[test]
    fn iterator_meets_in_the_middle() {
        let mut q = queue();
        for v in 1..=4 {
            q.push(v).unwrap();
        }
        let mut it = q.iter();
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next_back(), Some(4));
        assert_eq!(it.next(), Some(2));
        assert_eq!(it.next_back(), Some(3));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn verbose_queue_logs_every_mutation() {
        let collector = RecordingSubscriber::default();
        with_default(collector.clone(), || {
            let mut q = LinkedQueue::new(0, Verbosity::Verbose);
            q.push(1).unwrap();
            q.push(2).unwrap();
            assert_eq!(q.search(2), Ok(2));
            assert_eq!(q.pop(), Ok(1));
            q.free();
            q.free();
        });
        assert_eq!(
            collector.messages(),
            vec![
                "push 1: [QUEUE 0]  --->  (HEAD) [ 1 ] (TAIL)",
                "push 2: [QUEUE 0]  --->  (HEAD) [ 1 ] ---> [ 2 ] (TAIL)",
                "value 2 found at position 2",
                "pop 1: [QUEUE 0]  --->  (HEAD) [ 2 ] (TAIL)",
                "freeing queue 0",
                "all 1 nodes in queue 0 have been freed",
                "queue 0 is already empty, skipping free",
            ]
        );
    }

    #[test]
    fn quiet_queue_stays_silent_while_active() {
        let collector = RecordingSubscriber::default();
        with_default(collector.clone(), || {
            let mut q = queue();
            q.push(1).unwrap();
            q.push(2).unwrap();
            assert_eq!(q.search(2), Ok(2));
            assert_eq!(q.search(9), Err(QueueError::NotFound { value: 9 }));
            assert_eq!(q.pop(), Ok(1));
            q.free();
        });
        assert!(collector.events().is_empty());
    }

    #[test]
    fn quiet_free_on_empty_still_logs_skip() {
        let collector = RecordingSubscriber::default();
        with_default(collector.clone(), || {
            queue().free();
        });
        let events = collector.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message, "queue 0 is already empty, skipping free");
    }
}
