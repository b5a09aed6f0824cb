//! Deferred task queue.
//!
//! A [`TaskQueue<C>`] holds continuations that run later against a context
//! of type `C`. The page keeps one as its microtask queue and one as its
//! animation-frame queue; nothing ever blocks waiting for a task.
//!
//! Draining hands the current batch to the caller, so tasks posted while a
//! batch runs land in the next batch.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::targets;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A posted continuation, ready to run against its context.
pub struct Task<C> {
    id: TaskId,
    run: Box<dyn FnOnce(&mut C) + Send + 'static>,
}

impl<C> Task<C> {
    /// The ID returned when the task was posted.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Run the task.
    pub fn run(self, context: &mut C) {
        (self.run)(context);
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish()
    }
}

/// A FIFO queue of deferred tasks.
pub struct TaskQueue<C> {
    tasks: VecDeque<Task<C>>,
}

impl<C> TaskQueue<C> {
    /// Create a new task queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Post a task to run on the next drain.
    ///
    /// Returns the task ID that can be used to cancel the task.
    pub fn post<F>(&mut self, task: F) -> TaskId
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        let id = next_task_id();
        tracing::trace!(target: targets::TASK, id = id.as_u64(), "posted task");
        self.tasks.push_back(Task {
            id,
            run: Box::new(task),
        });
        id
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was found and cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Take the current batch of tasks in posting order.
    pub fn drain(&mut self) -> Vec<Task<C>> {
        self.tasks.drain(..).collect()
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_runs_in_order() {
        let mut queue = TaskQueue::<Vec<u32>>::new();
        queue.post(|log| log.push(1));
        queue.post(|log| log.push(2));
        assert_eq!(queue.pending_count(), 2);

        let mut log = Vec::new();
        for task in queue.drain() {
            task.run(&mut log);
        }
        assert_eq!(log, vec![1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_cancel() {
        let mut queue = TaskQueue::<Vec<u32>>::new();
        let first = queue.post(|log| log.push(1));
        queue.post(|log| log.push(2));
        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));

        let mut log = Vec::new();
        for task in queue.drain() {
            task.run(&mut log);
        }
        assert_eq!(log, vec![2]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut queue = TaskQueue::<()>::new();
        let a = queue.post(|_| {});
        let b = queue.post(|_| {});
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }
}
