use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many edits may sit unexecuted on one server. Overflow drops the
/// edit; workloads are assumed to read often enough to stay far below
/// this.
pub const TASK_QUEUE_CAPACITY: usize = 1000;

/// One deferred edit, copied off the incoming request at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTask {
    pub doc_name: String,
    pub doc_content: String,
}

/// Bounded FIFO of pending edits.
pub struct TaskQueue {
    tasks: VecDeque<EditTask>,
    capacity: usize,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::with_capacity(TASK_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a task; returns `false` (dropping the task) when full.
    pub fn enqueue(&mut self, task: EditTask) -> bool {
        if self.tasks.len() == self.capacity {
            return false;
        }
        self.tasks.push_back(task);
        true
    }

    /// Removes and returns the oldest pending task.
    pub fn dequeue(&mut self) -> Option<EditTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
