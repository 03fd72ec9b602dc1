//! Controller input snapshots and gain curves.
//!
//! A snapshot is produced continuously by an external sampler and is
//! read-only to the core. Absent inputs are a normal steady state (a
//! centred stick) and read as zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::InputId;
use crate::time::Timestamp;

/// Last sampled value of one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputValue {
    /// Normalised value, `[-1, 1]` for axes and `[0, 1]` for buttons.
    pub value: f64,
    /// When the value last changed.
    pub timestamp: Timestamp,
    /// When the input last went from released (zero) to non-zero.
    #[serde(default)]
    pub pressed_at: Option<Timestamp>,
}

impl InputValue {
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        !is_released(self.value)
    }

    /// Start of the current press, `None` while released.
    #[must_use]
    pub fn press_time(&self) -> Option<Timestamp> {
        self.pressed_at.filter(|_| self.is_pressed())
    }
}

fn is_released(value: f64) -> bool {
    value.abs() < f64::EPSILON
}

/// Current state of every known input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    inputs: HashMap<InputId, InputValue>,
}

impl InputSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample.
    ///
    /// The stored timestamp only moves when the value actually changes, so
    /// repeated samples of a held button keep the time of the press. The
    /// press time only moves when a released input becomes non-zero, so a
    /// held analog input drifting between non-zero values stays one press.
    pub fn record(&mut self, id: InputId, value: f64, timestamp: Timestamp) {
        match self.inputs.get_mut(&id) {
            Some(current) if (current.value - value).abs() < f64::EPSILON => {}
            Some(current) => {
                if is_released(current.value) && !is_released(value) {
                    current.pressed_at = Some(timestamp);
                }
                current.value = value;
                current.timestamp = timestamp;
            }
            None => {
                let pressed_at = (!is_released(value)).then_some(timestamp);
                self.inputs.insert(
                    id,
                    InputValue {
                        value,
                        timestamp,
                        pressed_at,
                    },
                );
            }
        }
    }

    /// Builder-style variant of [`record`](Self::record).
    #[must_use]
    pub fn with(mut self, id: InputId, value: f64, timestamp: Timestamp) -> Self {
        self.record(id, value, timestamp);
        self
    }

    #[must_use]
    pub fn get(&self, id: &InputId) -> Option<&InputValue> {
        self.inputs.get(id)
    }

    /// Value of the input, or `0` when it was never sampled.
    #[must_use]
    pub fn value(&self, id: &InputId) -> f64 {
        self.inputs.get(id).map_or(0.0, |input| input.value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Response curve applied to a raw input magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputGain {
    #[default]
    Linear,
    /// Fine control near the centre, `x³`.
    Exponential,
    /// Fast response near the centre, `∛x`.
    Logarithmic,
}

impl InputGain {
    /// Apply the curve. Sign is preserved and `[-1, 1]` maps onto itself.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Exponential => value.powi(3),
            Self::Logarithmic => value.cbrt(),
        }
    }
}
