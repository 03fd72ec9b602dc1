//! Task queue — pending commands plus execution bookkeeping.

use std::collections::{HashMap, VecDeque};

use hubdrive_domain::id::{BindingId, PortKey};
use hubdrive_domain::task::PortCommandTask;
use hubdrive_domain::time::Timestamp;

use crate::task_queue_compressor::compress;

/// Execution counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQueueStats {
    /// Tasks currently waiting for dispatch.
    pub pending: usize,
    /// Longest the pending list has been after compression.
    pub max_queue_length: usize,
    pub total_tasks_executed: u64,
    pub last_task_execution_time: Option<Timestamp>,
}

/// Pending tasks in dispatch order, kept compressed.
///
/// Also remembers the last executed task per port and per binding, which
/// the task builders compare against.
#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: VecDeque<PortCommandTask>,
    last_by_port: HashMap<PortKey, PortCommandTask>,
    last_by_binding: HashMap<BindingId, PortCommandTask>,
    consumed_by_binding: HashMap<BindingId, Timestamp>,
    max_queue_length: usize,
    total_tasks_executed: u64,
    last_task_execution_time: Option<Timestamp>,
}

impl TaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tasks` and compress the whole pending list in one step.
    ///
    /// The input timestamp of every task is remembered per binding, so a
    /// press stays consumed even when compression merges its task away.
    pub fn enqueue_all(&mut self, tasks: impl IntoIterator<Item = PortCommandTask>) {
        let mut pending: Vec<_> = self.pending.drain(..).collect();
        for task in tasks {
            self.consumed_by_binding
                .entry(task.binding_id)
                .and_modify(|consumed| *consumed = (*consumed).max(task.input_timestamp))
                .or_insert(task.input_timestamp);
            pending.push(task);
        }
        self.pending = compress(pending).into();
        self.max_queue_length = self.max_queue_length.max(self.pending.len());
    }

    /// Remove the task at the head of the queue.
    pub fn take_next(&mut self) -> Option<PortCommandTask> {
        self.pending.pop_front()
    }

    /// Record that `task` was sent to its hub at `at`.
    pub fn mark_executed(&mut self, task: PortCommandTask, at: Timestamp) {
        self.total_tasks_executed += 1;
        self.last_task_execution_time = Some(at);
        self.last_by_binding.insert(task.binding_id, task.clone());
        self.last_by_port.insert(task.port.clone(), task);
    }

    #[must_use]
    pub fn last_executed_for_binding(&self, binding_id: BindingId) -> Option<&PortCommandTask> {
        self.last_by_binding.get(&binding_id)
    }

    /// The binding's most recent task, pending or executed.
    ///
    /// A pending task supersedes the executed one, so a press that is still
    /// waiting for dispatch is not built a second time.
    #[must_use]
    pub fn latest_for_binding(&self, binding_id: BindingId) -> Option<&PortCommandTask> {
        self.pending
            .iter()
            .rev()
            .find(|task| task.binding_id == binding_id)
            .or_else(|| self.last_executed_for_binding(binding_id))
    }

    /// Latest input timestamp enqueued for the binding.
    #[must_use]
    pub fn consumed_until(&self, binding_id: BindingId) -> Option<Timestamp> {
        self.consumed_by_binding.get(&binding_id).copied()
    }

    #[must_use]
    pub fn last_executed_for_port(&self, port: &PortKey) -> Option<&PortCommandTask> {
        self.last_by_port.get(port)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> TaskQueueStats {
        TaskQueueStats {
            pending: self.pending.len(),
            max_queue_length: self.max_queue_length,
            total_tasks_executed: self.total_tasks_executed,
            last_task_execution_time: self.last_task_execution_time,
        }
    }
}
