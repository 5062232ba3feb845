use crate::error::Error;
use crate::task::PrefetchTask;
use std::collections::BinaryHeap;

/// A bounded priority queue of [`PrefetchTask`]s (§4.4: "queue length ≤
/// `max_queue_length`").
#[derive(Debug, Default)]
pub struct PrefetchQueue {
    heap: BinaryHeap<PrefetchTask>,
    capacity: usize,
}

impl PrefetchQueue {
    /// An empty queue bounded at `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self { heap: BinaryHeap::new(), capacity }
    }

    /// Enqueue a task, failing with [`Error::QueueFull`] rather than silently
    /// dropping work when at capacity.
    pub fn enqueue(&mut self, task: PrefetchTask) -> Result<(), Error> {
        if self.heap.len() >= self.capacity {
            return Err(Error::QueueFull(self.capacity));
        }
        self.heap.push(task);
        Ok(())
    }

    /// Pop the single most urgent task, if any.
    pub fn dequeue(&mut self) -> Option<PrefetchTask> {
        self.heap.pop()
    }

    /// Pop up to `n` of the most urgent tasks, in priority order.
    pub fn dequeue_up_to(&mut self, n: usize) -> Vec<PrefetchTask> {
        std::iter::from_fn(|| self.dequeue()).take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Priority;
    use crate::record::RecordType;
    use std::time::Instant;

    #[test]
    fn rejects_beyond_capacity() {
        let mut q = PrefetchQueue::new(1);
        q.enqueue(PrefetchTask::new("a.com", RecordType::A, Priority::Normal, Instant::now())).unwrap();
        let err = q.enqueue(PrefetchTask::new("b.com", RecordType::A, Priority::Normal, Instant::now()));
        assert!(matches!(err, Err(Error::QueueFull(1))));
    }

    #[test]
    fn dequeues_highest_priority_first() {
        let mut q = PrefetchQueue::new(10);
        q.enqueue(PrefetchTask::new("low.com", RecordType::A, Priority::Low, Instant::now())).unwrap();
        q.enqueue(PrefetchTask::new("crit.com", RecordType::A, Priority::Critical, Instant::now())).unwrap();
        assert_eq!(q.dequeue().unwrap().domain(), "crit.com");
        assert_eq!(q.dequeue().unwrap().domain(), "low.com");
    }
}
