//! Set angle — go to a fixed position on each press.

use hubdrive_domain::binding::SetAngleBinding;
use hubdrive_domain::command::{PortCommandPayload, SetAnglePayload};
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::task::PortCommandTask;

use super::{BuildContext, BuiltPayload, TaskBuilder};

#[derive(Debug, Clone, Default)]
pub struct SetAngleTaskBuilder {
    limits: MotorLimits,
}

impl SetAngleTaskBuilder {
    #[must_use]
    pub fn new(limits: MotorLimits) -> Self {
        Self { limits }
    }
}

impl TaskBuilder for SetAngleTaskBuilder {
    type Config = SetAngleBinding;

    // each press re-issues the move
    const SUPPRESS_REPEATS: bool = false;

    fn build_payload(&self, config: &SetAngleBinding, ctx: &BuildContext<'_>) -> Option<BuiltPayload> {
        let pressed_at = ctx.new_press(ctx.snapshot.get(&config.input.input))?;

        Some(BuiltPayload {
            payload: PortCommandPayload::SetAngle(SetAnglePayload {
                angle: config
                    .angle
                    .clamp(self.limits.min_raw_angle, self.limits.max_raw_angle),
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
