//! Task scheduler — builds tasks on every tick and dispatches them one at a
//! time.
//!
//! Producers ([`TaskScheduler::tick`], [`TaskScheduler::cleanup`]) mutate the
//! queue under a short synchronous lock. A single consumer
//! ([`TaskScheduler::run_dispatcher`]) sends queued tasks to their hub in
//! order and is woken through a [`Notify`] whenever work is enqueued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use hubdrive_domain::error::{HubDriveError, NotFoundError};
use hubdrive_domain::id::{BindingId, HubId};
use hubdrive_domain::input::InputSnapshot;
use hubdrive_domain::message::OutboundMessage;
use hubdrive_domain::scheme::ControlScheme;
use hubdrive_domain::task::PortCommandTask;
use hubdrive_domain::time::{self, Timestamp};

use crate::ports::HubMessenger;
use crate::task_builder::TaskBuilderSet;
use crate::task_queue::{TaskQueue, TaskQueueStats};

/// Drives the bindings of one control scheme.
pub struct TaskScheduler<M> {
    scheme: ControlScheme,
    builders: TaskBuilderSet,
    messengers: HashMap<HubId, M>,
    queue: Mutex<TaskQueue>,
    notify: Notify,
    closed: AtomicBool,
}

impl<M: HubMessenger> TaskScheduler<M> {
    /// Create a scheduler sending tasks through `messengers`, one per hub.
    pub fn new(scheme: ControlScheme, builders: TaskBuilderSet, messengers: HashMap<HubId, M>) -> Self {
        Self {
            scheme,
            builders,
            messengers,
            queue: Mutex::new(TaskQueue::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn scheme(&self) -> &ControlScheme {
        &self.scheme
    }

    fn lock_queue(&self) -> MutexGuard<'_, TaskQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every binding's builder against `snapshot` and enqueue the
    /// resulting tasks.
    ///
    /// Returns how many tasks were built, before compression.
    pub fn tick(&self, snapshot: &InputSnapshot, now: Timestamp) -> usize {
        let built = {
            let mut queue = self.lock_queue();
            let tasks: Vec<PortCommandTask> = self
                .scheme
                .bindings
                .iter()
                .filter_map(|binding| {
                    let last_task = queue.latest_for_binding(binding.id);
                    let consumed_until = queue.consumed_until(binding.id);
                    self.builders
                        .build_task(binding, snapshot, last_task, consumed_until, now)
                })
                .collect();
            let built = tasks.len();
            if built > 0 {
                queue.enqueue_all(tasks);
            }
            built
        };

        if built > 0 {
            tracing::trace!(built, "tasks enqueued");
            self.notify.notify_one();
        }
        built
    }

    /// Enqueue the cleanup task of every binding that has executed at least
    /// one task.
    ///
    /// Returns how many cleanup tasks were enqueued.
    pub fn cleanup(&self, now: Timestamp) -> usize {
        let count = {
            let mut queue = self.lock_queue();
            let tasks: Vec<PortCommandTask> = self
                .scheme
                .bindings
                .iter()
                .filter_map(|binding| {
                    let previous = queue.last_executed_for_binding(binding.id)?;
                    self.builders.build_cleanup_task(binding, previous, now)
                })
                .collect();
            let count = tasks.len();
            queue.enqueue_all(tasks);
            count
        };

        tracing::info!(scheme = %self.scheme.name, count, "cleanup tasks enqueued");
        self.notify.notify_one();
        count
    }

    /// Send the task at the head of the queue.
    ///
    /// Returns `Ok(None)` when nothing is pending. A task whose send failed
    /// is not retried.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError::Hub`] when no messenger is registered for
    /// the task's hub, or the messenger's error when sending fails.
    pub async fn dispatch_next(&self) -> Result<Option<PortCommandTask>, HubDriveError> {
        let next = self.lock_queue().take_next();
        let Some(task) = next else {
            return Ok(None);
        };

        let messenger = self
            .messengers
            .get(&task.port.hub_id)
            .ok_or_else(|| NotFoundError::Hub(task.port.hub_id.clone()))?;
        messenger
            .send(OutboundMessage::PortOutput {
                port_id: task.port.port_id,
                payload: task.payload,
            })
            .await?;

        tracing::debug!(
            port = %task.port,
            kind = %task.kind(),
            payload = %task.payload,
            "task dispatched"
        );
        self.lock_queue().mark_executed(task.clone(), time::now());
        Ok(Some(task))
    }

    /// Dispatch every pending task.
    ///
    /// Returns how many tasks were sent.
    ///
    /// # Errors
    ///
    /// Stops at the first failing task and returns its error.
    pub async fn drain(&self) -> Result<usize, HubDriveError> {
        let mut sent = 0;
        while self.dispatch_next().await?.is_some() {
            sent += 1;
        }
        Ok(sent)
    }

    /// Single consumer loop.
    ///
    /// Dispatches tasks as they are enqueued, logging failures, until
    /// [`TaskScheduler::close`] is called and the queue is empty.
    pub async fn run_dispatcher(&self) {
        loop {
            match self.dispatch_next().await {
                Ok(Some(_)) => {}
                Ok(None) if self.closed.load(Ordering::Acquire) => break,
                Ok(None) => self.notify.notified().await,
                Err(err) => tracing::warn!(%err, "failed to dispatch task"),
            }
        }
        tracing::debug!("dispatcher stopped");
    }

    /// Let the dispatcher stop once the queue is drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn stats(&self) -> TaskQueueStats {
        self.lock_queue().stats()
    }

    /// Last task the binding had dispatched.
    pub fn last_executed_task(&self, binding_id: BindingId) -> Option<PortCommandTask> {
        self.lock_queue().last_executed_for_binding(binding_id).cloned()
    }
}
