//! Servo — absolute position tracking an axis.

use hubdrive_domain::binding::ServoBinding;
use hubdrive_domain::command::{PortCommandPayload, ServoPayload};
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::task::PortCommandTask;

use super::{BuildContext, BuiltPayload, TaskBuilder};

/// Maps an input in `[-1, 1]` onto `[-range / 2, range / 2]` around the
/// binding's centre position.
#[derive(Debug, Clone, Default)]
pub struct ServoTaskBuilder {
    limits: MotorLimits,
}

impl ServoTaskBuilder {
    #[must_use]
    pub fn new(limits: MotorLimits) -> Self {
        Self { limits }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_angle(&self, config: &ServoBinding, value: f64) -> i32 {
        let range = config.range.min(self.limits.max_servo_range);
        let half_range = f64::from(range) / 2.0;
        let direction = if config.invert { -1.0 } else { 1.0 };
        let angle = config.input.gain.apply(value.clamp(-1.0, 1.0)) * half_range * direction;
        // bounded by half of a u16 range
        angle.clamp(-half_range, half_range).round() as i32
    }
}

impl TaskBuilder for ServoTaskBuilder {
    type Config = ServoBinding;

    fn build_payload(&self, config: &ServoBinding, ctx: &BuildContext<'_>) -> Option<BuiltPayload> {
        let input = ctx.snapshot.get(&config.input.input);
        let value = input.map_or(0.0, |input| input.value);

        Some(BuiltPayload {
            payload: PortCommandPayload::Servo(ServoPayload {
                angle: self.calculate_angle(config, value),
                aposition: config.aposition,
                speed: config.speed,
                power: config.power,
                profile: config.profile,
            }),
            input_timestamp: input.map_or(ctx.now, |input| input.timestamp),
        })
    }

    /// Return the servo to its centre.
    fn build_cleanup_payload(&self, previous: &PortCommandTask) -> Option<PortCommandPayload> {
        let PortCommandPayload::Servo(previous) = &previous.payload else {
            return None;
        };
        Some(PortCommandPayload::Servo(ServoPayload {
            angle: 0,
            ..*previous
        }))
    }
}
