//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HubDriveError`] at port boundaries via `#[from]` or an explicit
//! `into_domain()`.

use crate::id::{BindingId, HubId};

/// Top-level error shared by the domain, the application core and adapters.
#[derive(Debug, thiserror::Error)]
pub enum HubDriveError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced resource does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The byte channel or the message encoding failed.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The reply stream was closed before a matching reply arrived.
    #[error("reply channel closed")]
    ChannelClosed,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Two bindings of the same scheme share an id.
    #[error("duplicate binding id {0}")]
    DuplicateBindingId(BindingId),

    /// A control scheme must carry a name.
    #[error("name must not be empty")]
    EmptyName,

    /// A configured speed is outside the motor limits.
    #[error("speed {value} is outside of [{min}, {max}]")]
    SpeedOutOfRange {
        /// Configured value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A configured power is outside the motor limits.
    #[error("power {value} is outside of [{min}, {max}]")]
    PowerOutOfRange {
        /// Configured value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A servo range is zero or exceeds the servo limit.
    #[error("servo range {value} is outside of (0, {max}]")]
    ServoRangeOutOfRange {
        /// Configured value.
        value: u16,
        /// Upper bound.
        max: u16,
    },

    /// A stepper binding must rotate by a non-zero amount.
    #[error("stepper degree must not be zero")]
    ZeroStepperDegree,
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    /// No messenger is registered for the hub a task targets.
    #[error("no link registered for hub {0}")]
    Hub(HubId),
}
