//! Protocol-defined motor limits.

/// Absolute bounds every emitted command must respect, whatever the
/// binding configuration says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorLimits {
    pub max_speed: f64,
    pub min_speed: f64,
    pub max_power: f64,
    pub min_power: f64,
    /// Widest servo sweep, in degrees, centre to centre.
    pub max_servo_range: u16,
    pub min_raw_angle: i32,
    pub max_raw_angle: i32,
}

impl MotorLimits {
    /// Limits of the hub protocol.
    pub const PROTOCOL: Self = Self {
        max_speed: 100.0,
        min_speed: -100.0,
        max_power: 100.0,
        min_power: 0.0,
        max_servo_range: 360,
        min_raw_angle: i32::MIN,
        max_raw_angle: i32::MAX,
    };

    /// Clamp a signed speed into `[min_speed, max_speed]`.
    #[must_use]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.clamp(self.min_speed, self.max_speed)
    }

    /// Clamp a power into `[min_power, max_power]`.
    #[must_use]
    pub fn clamp_power(&self, power: f64) -> f64 {
        power.clamp(self.min_power, self.max_power)
    }
}

impl Default for MotorLimits {
    fn default() -> Self {
        Self::PROTOCOL
    }
}
