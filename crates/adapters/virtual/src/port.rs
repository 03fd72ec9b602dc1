//! Port output commands as the simulated hub understands them.

const START_SPEED: u8 = 0x07;
const START_SPEED_FOR_DEGREES: u8 = 0x0B;
const GOTO_ABSOLUTE_POSITION: u8 = 0x0D;

/// A port output command received by the virtual hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCommand {
    StartSpeed {
        speed: i8,
        power: u8,
    },
    StartSpeedForDegrees {
        degrees: u32,
        speed: i8,
        power: u8,
    },
    GotoAbsolutePosition {
        position: i32,
        speed: u8,
        power: u8,
    },
}

impl PortCommand {
    /// Parse `[port, startup, sub command, parameters...]`.
    pub(crate) fn parse(payload: &[u8]) -> Option<(u8, Self)> {
        let (&[port_id, _startup, sub_command], parameters) = payload.split_first_chunk::<3>()?;
        let command = match (sub_command, parameters) {
            (START_SPEED, &[speed, power, ..]) => Self::StartSpeed {
                speed: speed.cast_signed(),
                power,
            },
            (START_SPEED_FOR_DEGREES, &[d0, d1, d2, d3, speed, power, ..]) => {
                Self::StartSpeedForDegrees {
                    degrees: u32::from_le_bytes([d0, d1, d2, d3]),
                    speed: speed.cast_signed(),
                    power,
                }
            }
            (GOTO_ABSOLUTE_POSITION, &[p0, p1, p2, p3, speed, power, ..]) => {
                Self::GotoAbsolutePosition {
                    position: i32::from_le_bytes([p0, p1, p2, p3]),
                    speed,
                    power,
                }
            }
            _ => return None,
        };
        Some((port_id, command))
    }
}

/// Simulated state of one output port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortState {
    /// Current run speed, zero when holding a position.
    pub speed: i8,
    pub power: u8,
    /// Absolute position in degrees.
    pub position: i32,
}

impl PortState {
    pub(crate) fn apply(&mut self, command: PortCommand) {
        match command {
            PortCommand::StartSpeed { speed, power } => {
                self.speed = speed;
                self.power = power;
            }
            PortCommand::StartSpeedForDegrees {
                degrees,
                speed,
                power,
            } => {
                let degrees = i32::try_from(degrees).unwrap_or(i32::MAX);
                let delta = if speed < 0 { -degrees } else { degrees };
                self.position = self.position.saturating_add(delta);
                self.speed = 0;
                self.power = power;
            }
            PortCommand::GotoAbsolutePosition {
                position, power, ..
            } => {
                self.position = position;
                self.speed = 0;
                self.power = power;
            }
        }
    }
}

/// Feedback flags reported once a command is applied: completed and idle.
pub(crate) const COMPLETED_AND_IDLE: u8 = 0b0000_1010;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_start_speed() {
        assert_eq!(
            PortCommand::parse(&[0x01, 0x11, 0x07, 0xCE, 0x50, 0x00]),
            Some((1, PortCommand::StartSpeed { speed: -50, power: 80 }))
        );
    }

    #[test]
    fn should_parse_goto_absolute_position() {
        assert_eq!(
            PortCommand::parse(&[0x00, 0x11, 0x0D, 0xEC, 0xFF, 0xFF, 0xFF, 0x64, 0x46, 0x7E, 0x03]),
            Some((
                0,
                PortCommand::GotoAbsolutePosition {
                    position: -20,
                    speed: 100,
                    power: 70
                }
            ))
        );
    }

    #[test]
    fn should_reject_unknown_sub_command() {
        assert_eq!(PortCommand::parse(&[0x00, 0x11, 0x51, 0x00]), None);
        assert_eq!(PortCommand::parse(&[0x00, 0x11]), None);
    }

    #[test]
    fn should_move_position_by_signed_degrees() {
        let mut state = PortState::default();
        state.apply(PortCommand::StartSpeedForDegrees {
            degrees: 90,
            speed: -50,
            power: 100,
        });
        state.apply(PortCommand::StartSpeedForDegrees {
            degrees: 30,
            speed: 50,
            power: 100,
        });
        assert_eq!(state.position, -60);
    }

    #[test]
    fn should_track_run_speed() {
        let mut state = PortState::default();
        state.apply(PortCommand::StartSpeed { speed: 75, power: 90 });
        assert_eq!(state.speed, 75);
        state.apply(PortCommand::GotoAbsolutePosition {
            position: 180,
            speed: 50,
            power: 60,
        });
        assert_eq!(state, PortState { speed: 0, power: 60, position: 180 });
    }
}
