//! Task queue compressor — coalesces pending tasks per `(port, kind)`.
//!
//! Compression is a pure function of the pending list. At most one task per
//! [`TaskKey`] survives and survivors keep the position at which their key
//! first appeared.

use std::collections::HashMap;

use hubdrive_domain::command::{PortCommandPayload, TaskKind};
use hubdrive_domain::task::{PortCommandTask, TaskKey};

/// How two pending tasks sharing a key are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    /// The most recent task wins.
    Replace,
    /// Relative movements are summed into the most recent task.
    Accumulate,
}

impl CompressionStrategy {
    #[must_use]
    pub fn for_kind(kind: TaskKind) -> Self {
        match kind {
            TaskKind::SetSpeed | TaskKind::Servo | TaskKind::SetAngle => Self::Replace,
            TaskKind::Stepper => Self::Accumulate,
        }
    }

    fn merge(self, pending: Option<PortCommandTask>, next: PortCommandTask) -> Option<PortCommandTask> {
        let Some(pending) = pending else {
            return Some(next);
        };
        match self {
            Self::Replace => Some(next),
            Self::Accumulate => accumulate(&pending, next),
        }
    }
}

fn accumulate(pending: &PortCommandTask, mut next: PortCommandTask) -> Option<PortCommandTask> {
    if let (PortCommandPayload::Stepper(pending), PortCommandPayload::Stepper(step)) =
        (&pending.payload, &mut next.payload)
    {
        step.degree = step.degree.saturating_add(pending.degree);
        // opposite steps cancel out
        if step.degree == 0 {
            return None;
        }
    }
    Some(next)
}

/// Coalesce `tasks` so that each `(port, kind)` appears at most once.
#[must_use]
pub fn compress(tasks: Vec<PortCommandTask>) -> Vec<PortCommandTask> {
    let mut slots: Vec<Option<PortCommandTask>> = Vec::with_capacity(tasks.len());
    let mut positions: HashMap<TaskKey, usize> = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let key = task.key();
        if let Some(&position) = positions.get(&key) {
            let strategy = CompressionStrategy::for_kind(key.kind);
            slots[position] = strategy.merge(slots[position].take(), task);
        } else {
            positions.insert(key, slots.len());
            slots.push(Some(task));
        }
    }

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_builder::fixtures::{at, port};
    use hubdrive_domain::command::{
        MotionProfile, MotorEndState, SetSpeedPayload, StepperPayload,
    };
    use hubdrive_domain::id::{BindingId, HubId, PortKey};

    fn speed_task(port: PortKey, speed: i8, millis: i64) -> PortCommandTask {
        PortCommandTask {
            binding_id: BindingId::new(),
            port,
            payload: PortCommandPayload::SetSpeed(SetSpeedPayload {
                speed,
                power: 100,
                active_input: speed != 0,
                profile: MotionProfile::default(),
            }),
            input_timestamp: at(millis),
        }
    }

    fn step_task(port: PortKey, degree: i32, millis: i64) -> PortCommandTask {
        PortCommandTask {
            binding_id: BindingId::new(),
            port,
            payload: PortCommandPayload::Stepper(StepperPayload {
                degree,
                speed: 50,
                power: 100,
                end_state: MotorEndState::Hold,
                profile: MotionProfile::default(),
            }),
            input_timestamp: at(millis),
        }
    }

    fn speeds(tasks: &[PortCommandTask]) -> Vec<(u8, i8)> {
        tasks
            .iter()
            .filter_map(|task| match task.payload {
                PortCommandPayload::SetSpeed(payload) => Some((task.port.port_id, payload.speed)),
                _ => None,
            })
            .collect()
    }

    // ── Replace ──

    #[test]
    fn should_return_empty_list_unchanged() {
        assert!(compress(Vec::new()).is_empty());
    }

    #[test]
    fn should_keep_latest_task_per_key_in_first_appearance_order() {
        let tasks = vec![
            speed_task(port(0), 10, 1),
            speed_task(port(1), 20, 2),
            speed_task(port(0), 30, 3),
        ];

        let compressed = compress(tasks);

        assert_eq!(speeds(&compressed), vec![(0, 30), (1, 20)]);
        assert_eq!(compressed[0].input_timestamp, at(3));
    }

    #[test]
    fn should_keep_tasks_of_different_kinds_on_same_port() {
        let tasks = vec![speed_task(port(0), 10, 1), step_task(port(0), 90, 2)];
        assert_eq!(compress(tasks).len(), 2);
    }

    #[test]
    fn should_keep_same_port_id_on_different_hubs_apart() {
        let tasks = vec![
            speed_task(PortKey::new(HubId::new("left"), 0), 10, 1),
            speed_task(PortKey::new(HubId::new("right"), 0), 20, 2),
        ];
        assert_eq!(compress(tasks).len(), 2);
    }

    #[test]
    fn should_be_idempotent() {
        let tasks = vec![
            speed_task(port(0), 10, 1),
            step_task(port(1), 45, 2),
            speed_task(port(0), 30, 3),
            step_task(port(1), 45, 4),
        ];

        let once = compress(tasks);
        let twice = compress(once.clone());

        assert_eq!(once, twice);
    }

    // ── Accumulate ──

    #[test]
    fn should_sum_stepper_degrees() {
        let tasks = vec![
            step_task(port(0), 45, 1),
            step_task(port(0), 45, 2),
            step_task(port(0), -30, 3),
        ];

        let compressed = compress(tasks);

        assert_eq!(compressed.len(), 1);
        match compressed[0].payload {
            PortCommandPayload::Stepper(payload) => assert_eq!(payload.degree, 60),
            other => panic!("expected stepper payload, got {other:?}"),
        }
        assert_eq!(compressed[0].input_timestamp, at(3));
    }

    #[test]
    fn should_drop_steps_that_cancel_out() {
        let tasks = vec![step_task(port(0), 45, 1), step_task(port(0), -45, 2)];
        assert!(compress(tasks).is_empty());
    }

    #[test]
    fn should_reuse_slot_after_steps_cancel_out() {
        let tasks = vec![
            step_task(port(0), 45, 1),
            speed_task(port(1), 10, 2),
            step_task(port(0), -45, 3),
            step_task(port(0), 90, 4),
        ];

        let compressed = compress(tasks);

        assert_eq!(compressed.len(), 2);
        assert_eq!(compressed[0].port, port(0));
        assert_eq!(compressed[1].port, port(1));
    }

    #[test]
    fn should_pick_strategy_per_kind() {
        assert_eq!(
            CompressionStrategy::for_kind(TaskKind::SetSpeed),
            CompressionStrategy::Replace
        );
        assert_eq!(
            CompressionStrategy::for_kind(TaskKind::Stepper),
            CompressionStrategy::Accumulate
        );
    }
}
