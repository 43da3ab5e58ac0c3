//! Logical simulation clock.
//!
//! Periodic tasks are owned by the `Scheduler`. Due tasks come out in
//! `(due time, schedule order)` order, so every replica that schedules the same
//! tasks and advances to the same times runs them identically.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Work a scheduled task stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    StepBody(u32),
}

#[derive(Debug)]
struct Periodic {
    task: Task,
    period_ms: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    /// (due_ms, seq, id); entries of cancelled tasks are skipped when popped
    queue: BinaryHeap<Reverse<(u64, u64, TaskId)>>,
    tasks: HashMap<TaskId, Periodic>,
    next_task_id: u64,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time (ms)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` every `period_ms`, first at `now + period_ms`.
    pub fn schedule_periodic(&mut self, task: Task, period_ms: u64) -> TaskId {
        let period_ms = period_ms.max(1);
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.tasks.insert(id, Periodic { task, period_ms });
        self.push(self.now_ms + period_ms, id);
        id
    }

    /// Returns false if the task was not scheduled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
        self.queue.clear();
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Pop the earliest task due at or before `until_ms` and re-arm it.
    /// Moves the clock to the task's due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(u64, Task)> {
        loop {
            let Reverse((due, _, id)) = *self.queue.peek()?;
            if due > until_ms {
                return None;
            }
            self.queue.pop();

            let Some(periodic) = self.tasks.get(&id) else {
                continue;
            };
            let task = periodic.task;
            let next_due = due + periodic.period_ms;

            self.now_ms = due;
            self.push(next_due, id);
            return Some((due, task));
        }
    }

    /// Move the clock forward once everything due up to `until_ms` has run.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    fn push(&mut self, due_ms: u64, id: TaskId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due_ms, seq, id)));
    }
}
