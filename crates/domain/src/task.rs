//! Task — one command payload bound for one port.

use serde::{Deserialize, Serialize};

use crate::command::{PortCommandPayload, TaskKind};
use crate::id::{BindingId, PortKey};
use crate::time::Timestamp;

/// Key under which pending tasks are coalesced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub port: PortKey,
    pub kind: TaskKind,
}

/// The unit placed on the command queue.
///
/// Once dispatched, a task is retained as the "last executed task" of its
/// binding and of its port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortCommandTask {
    pub binding_id: BindingId,
    pub port: PortKey,
    pub payload: PortCommandPayload,
    /// Timestamp of the input sample that produced the payload.
    pub input_timestamp: Timestamp,
}

impl PortCommandTask {
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn key(&self) -> TaskKey {
        TaskKey {
            port: self.port.clone(),
            kind: self.kind(),
        }
    }
}
