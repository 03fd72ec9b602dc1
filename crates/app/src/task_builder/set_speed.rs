//! Continuous speed control.

use hubdrive_domain::binding::SpeedBinding;
use hubdrive_domain::command::{PortCommandPayload, SetSpeedPayload};
use hubdrive_domain::input::InputGain;
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::task::PortCommandTask;

use super::{BuildContext, BuiltPayload, TaskBuilder, is_zero};

/// Speeds are compared against the snap thresholds at this granularity.
const SPEED_STEP: f64 = 5.0;

/// Below this (rounded) magnitude the motor is stopped, and within this
/// distance of the maximum it runs at exactly the maximum.
const SPEED_SNAP_THRESHOLD: f64 = 10.0;

/// Builds [`SetSpeedPayload`]s from an accelerate and an optional brake
/// input.
#[derive(Debug, Clone, Default)]
pub struct SetSpeedTaskBuilder {
    limits: MotorLimits,
}

impl SetSpeedTaskBuilder {
    #[must_use]
    pub fn new(limits: MotorLimits) -> Self {
        Self { limits }
    }

    /// Toggle bindings flip between stopped and running on every press.
    ///
    /// The current state is recovered from the binding's last executed
    /// task: no task or a stopped one means the next press starts the
    /// motor.
    fn toggle_payload(&self, config: &SpeedBinding, ctx: &BuildContext<'_>) -> SetSpeedPayload {
        let is_running = ctx.last_task.is_some_and(|last| match &last.payload {
            PortCommandPayload::SetSpeed(payload) => payload.speed != 0,
            _ => false,
        });

        let (accelerate, brake) = if is_running { (0.0, 0.0) } else { (1.0, 0.0) };
        let speed = self.calculate_speed(accelerate, brake, config.max_speed, config.invert, config.accelerate.gain);

        SetSpeedPayload {
            speed: to_protocol_speed(speed),
            power: to_protocol_power(self.calculate_power(accelerate, brake, config.power)),
            active_input: true,
            profile: config.profile,
        }
    }

    fn calculate_speed(
        &self,
        accelerate: f64,
        brake: f64,
        max_speed: f64,
        invert: bool,
        gain: InputGain,
    ) -> f64 {
        if is_zero(accelerate) {
            return 0.0;
        }
        let magnitude = accelerate.signum() * (accelerate.abs() - brake.abs());
        let direction = if invert { -1.0 } else { 1.0 };
        let speed = gain.apply(magnitude) * max_speed * direction;

        self.limits.clamp_speed(snap_speed(speed, max_speed))
    }

    fn calculate_power(&self, accelerate: f64, brake: f64, max_power: f64) -> f64 {
        if is_zero(accelerate) && is_zero(brake) {
            return 0.0;
        }
        if !is_zero(accelerate) {
            return self.limits.clamp_power(max_power);
        }
        self.limits.clamp_power(max_power * brake.abs())
    }
}

impl TaskBuilder for SetSpeedTaskBuilder {
    type Config = SpeedBinding;

    fn build_payload(&self, config: &SpeedBinding, ctx: &BuildContext<'_>) -> Option<BuiltPayload> {
        let accelerate_input = ctx.snapshot.get(&config.accelerate.input);

        // brake input is ignored for toggle bindings
        if config.is_toggle {
            let pressed_at = ctx.new_press(accelerate_input)?;
            return Some(BuiltPayload {
                payload: PortCommandPayload::SetSpeed(self.toggle_payload(config, ctx)),
                input_timestamp: pressed_at,
            });
        }

        let input_timestamp = accelerate_input.map_or(ctx.now, |input| input.timestamp);

        let accelerate = accelerate_input.map_or(0.0, |input| input.value);
        let brake = config
            .brake
            .as_ref()
            .map_or(0.0, |brake| ctx.snapshot.value(&brake.input));
        let speed = self.calculate_speed(
            accelerate,
            brake,
            config.max_speed,
            config.invert,
            config.accelerate.gain,
        );

        let payload = SetSpeedPayload {
            speed: to_protocol_speed(speed),
            power: to_protocol_power(self.calculate_power(accelerate, brake, config.power)),
            active_input: !is_zero(accelerate),
            profile: config.profile,
        };

        Some(BuiltPayload {
            payload: PortCommandPayload::SetSpeed(payload),
            input_timestamp,
        })
    }

    fn build_cleanup_payload(&self, previous: &PortCommandTask) -> Option<PortCommandPayload> {
        let PortCommandPayload::SetSpeed(previous) = &previous.payload else {
            return None;
        };
        Some(PortCommandPayload::SetSpeed(SetSpeedPayload {
            speed: 0,
            power: 0,
            active_input: false,
            profile: previous.profile,
        }))
    }
}

/// Collapse idle jitter to zero and near-maximum values to the maximum.
fn snap_speed(speed: f64, max_speed: f64) -> f64 {
    let stepped = (speed / SPEED_STEP).round() * SPEED_STEP;
    if stepped.abs() < SPEED_SNAP_THRESHOLD {
        return 0.0;
    }
    if stepped.abs() >= max_speed - SPEED_SNAP_THRESHOLD {
        return max_speed * stepped.signum();
    }
    speed
}

#[allow(clippy::cast_possible_truncation)]
fn to_protocol_speed(speed: f64) -> i8 {
    // clamped to [-100, 100] by the caller
    speed.round() as i8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_protocol_power(power: f64) -> u8 {
    // clamped to [0, 100] by the caller
    power.round() as u8
}
