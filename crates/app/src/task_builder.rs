//! Task builders — turn the current input state into port commands.
//!
//! There is one builder per command kind. Each is a pure function of the
//! binding configuration, the input snapshot and the binding's own last
//! executed task; none of them block or touch the queue.
//! [`TaskBuilderSet`] picks the builder matching a binding with an
//! exhaustive `match`, so a new [`BindingConfig`] variant cannot be left
//! unhandled.

mod servo;
mod set_angle;
mod set_speed;
mod stepper;

pub use servo::ServoTaskBuilder;
pub use set_angle::SetAngleTaskBuilder;
pub use set_speed::SetSpeedTaskBuilder;
pub use stepper::StepperTaskBuilder;

use hubdrive_domain::binding::{Binding, BindingConfig};
use hubdrive_domain::command::PortCommandPayload;
use hubdrive_domain::id::BindingId;
use hubdrive_domain::input::{InputSnapshot, InputValue};
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::task::PortCommandTask;
use hubdrive_domain::time::Timestamp;

/// Everything a builder may read besides its own configuration.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub binding_id: BindingId,
    pub snapshot: &'a InputSnapshot,
    /// The binding's own last executed task, never another binding's.
    pub last_task: Option<&'a PortCommandTask>,
    /// Latest input timestamp the binding has already turned into a task,
    /// including tasks merged away before dispatch.
    pub consumed_until: Option<Timestamp>,
    /// Tick time, used when the driving input was never sampled.
    pub now: Timestamp,
}

impl BuildContext<'_> {
    /// Start time of the press `input` holds, when no task has consumed it
    /// yet.
    ///
    /// A press starts when the input leaves zero; value changes while it is
    /// held do not count as a new press.
    fn new_press(&self, input: Option<&InputValue>) -> Option<Timestamp> {
        let pressed_at = input?.press_time()?;
        let consumed = self
            .last_task
            .map(|last| last.input_timestamp)
            .max(self.consumed_until);
        consumed
            .is_none_or(|consumed| pressed_at > consumed)
            .then_some(pressed_at)
    }
}

/// A payload together with the timestamp of the sample that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltPayload {
    pub payload: PortCommandPayload,
    pub input_timestamp: Timestamp,
}

/// Strategy for one command kind.
pub trait TaskBuilder {
    /// Binding configuration this builder understands.
    type Config;

    /// Drop a payload identical to the binding's last executed one.
    ///
    /// Builders emitting relative or one-shot commands opt out, since
    /// repeating them is meaningful.
    const SUPPRESS_REPEATS: bool = true;

    /// Next payload for the binding, or `None` when nothing should be sent
    /// this tick.
    fn build_payload(&self, config: &Self::Config, ctx: &BuildContext<'_>) -> Option<BuiltPayload>;

    /// Payload that winds the port down once the binding is deactivated.
    fn build_cleanup_payload(&self, previous: &PortCommandTask) -> Option<PortCommandPayload>;
}

/// One builder per command kind, dispatched by binding configuration.
#[derive(Debug, Clone, Default)]
pub struct TaskBuilderSet {
    set_speed: SetSpeedTaskBuilder,
    servo: ServoTaskBuilder,
    set_angle: SetAngleTaskBuilder,
    stepper: StepperTaskBuilder,
}

impl TaskBuilderSet {
    #[must_use]
    pub fn new(limits: MotorLimits) -> Self {
        Self {
            set_speed: SetSpeedTaskBuilder::new(limits),
            servo: ServoTaskBuilder::new(limits),
            set_angle: SetAngleTaskBuilder::new(limits),
            stepper: StepperTaskBuilder::new(limits),
        }
    }

    /// Build the next task for `binding`.
    ///
    /// `last_task` may be any task previously executed on the binding's
    /// port; only a task of the same binding is taken into account.
    /// `consumed_until` is the latest input timestamp already turned into a
    /// task for this binding.
    #[must_use]
    pub fn build_task(
        &self,
        binding: &Binding,
        snapshot: &InputSnapshot,
        last_task: Option<&PortCommandTask>,
        consumed_until: Option<Timestamp>,
        now: Timestamp,
    ) -> Option<PortCommandTask> {
        let ctx = BuildContext {
            binding_id: binding.id,
            snapshot,
            last_task: last_task.filter(|task| task.binding_id == binding.id),
            consumed_until,
            now,
        };
        let built = match &binding.config {
            BindingConfig::Speed(config) => run(&self.set_speed, config, &ctx),
            BindingConfig::Servo(config) => run(&self.servo, config, &ctx),
            BindingConfig::SetAngle(config) => run(&self.set_angle, config, &ctx),
            BindingConfig::Stepper(config) => run(&self.stepper, config, &ctx),
        }?;

        Some(PortCommandTask {
            binding_id: binding.id,
            port: binding.output.clone(),
            payload: built.payload,
            input_timestamp: built.input_timestamp,
        })
    }

    /// Build the task that winds `binding` down, given the last task it
    /// executed.
    #[must_use]
    pub fn build_cleanup_task(
        &self,
        binding: &Binding,
        previous: &PortCommandTask,
        now: Timestamp,
    ) -> Option<PortCommandTask> {
        let payload = match &binding.config {
            BindingConfig::Speed(_) => self.set_speed.build_cleanup_payload(previous),
            BindingConfig::Servo(_) => self.servo.build_cleanup_payload(previous),
            BindingConfig::SetAngle(_) => self.set_angle.build_cleanup_payload(previous),
            BindingConfig::Stepper(_) => self.stepper.build_cleanup_payload(previous),
        }?;

        Some(PortCommandTask {
            binding_id: binding.id,
            port: binding.output.clone(),
            payload,
            input_timestamp: now,
        })
    }
}

fn run<B: TaskBuilder>(
    builder: &B,
    config: &B::Config,
    ctx: &BuildContext<'_>,
) -> Option<BuiltPayload> {
    let built = builder.build_payload(config, ctx)?;
    if B::SUPPRESS_REPEATS && ctx.last_task.is_some_and(|last| last.payload == built.payload) {
        return None;
    }
    Some(built)
}

fn is_zero(value: f64) -> bool {
    value.abs() < f64::EPSILON
}
