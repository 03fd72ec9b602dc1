//! Stepper — rotate by a fixed step per press.

use hubdrive_domain::binding::StepperBinding;
use hubdrive_domain::command::{PortCommandPayload, StepperPayload};
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::task::PortCommandTask;

use super::{BuildContext, BuiltPayload, TaskBuilder};

#[derive(Debug, Clone, Default)]
pub struct StepperTaskBuilder {
    limits: MotorLimits,
}

impl StepperTaskBuilder {
    #[must_use]
    pub fn new(limits: MotorLimits) -> Self {
        Self { limits }
    }
}

impl TaskBuilder for StepperTaskBuilder {
    type Config = StepperBinding;

    const SUPPRESS_REPEATS: bool = false;

    fn build_payload(&self, config: &StepperBinding, ctx: &BuildContext<'_>) -> Option<BuiltPayload> {
        let cw = config
            .cw
            .as_ref()
            .and_then(|cw| ctx.new_press(ctx.snapshot.get(&cw.input)));
        let ccw = config
            .ccw
            .as_ref()
            .and_then(|ccw| ctx.new_press(ctx.snapshot.get(&ccw.input)));

        // the most recent press wins when both are pending
        let (pressed_at, direction) = match (cw, ccw) {
            (Some(cw), Some(ccw)) if ccw > cw => (ccw, -1),
            (Some(cw), _) => (cw, 1),
            (None, Some(ccw)) => (ccw, -1),
            (None, None) => return None,
        };

        let degree = config.degree.abs().saturating_mul(direction);
        Some(BuiltPayload {
            payload: PortCommandPayload::Stepper(StepperPayload {
                degree: degree.clamp(self.limits.min_raw_angle, self.limits.max_raw_angle),
                speed: config.speed,
                power: config.power,
                end_state: config.end_state,
                profile: config.profile,
            }),
            input_timestamp: pressed_at,
        })
    }

    fn build_cleanup_payload(&self, _previous: &PortCommandTask) -> Option<PortCommandPayload> {
        None
    }
}
