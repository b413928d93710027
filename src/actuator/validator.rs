use crate::actuator::config::ServerConfig;
use crate::actuator::error::ActuatorError;
use crate::actuator::Command;
use crate::protocol::{CommandRequest, SvenCommand, SvenPosition};

/// Limits applied to incoming command values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub max_duration_ms: i64,
    pub max_distance_cm: i64,
    pub min_height_mm: u32,
    pub max_height_mm: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ValidatorConfig {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            max_duration_ms: cfg.max_duration_ms,
            max_distance_cm: cfg.max_distance_cm,
            min_height_mm: cfg.min_height_mm,
            max_height_mm: cfg.max_height_mm,
        }
    }
}

/// Checks a wire request against mode-dependent units and ranges and turns it
/// into a typed [`Command`].
#[derive(Debug, Clone, Default)]
pub struct CommandValidator {
    config: ValidatorConfig,
}

impl CommandValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, req: &CommandRequest) -> Result<Command, ActuatorError> {
        let value = req.value;
        let invalid = |reason: String| ActuatorError::InvalidValue {
            command: req.command,
            value,
            reason,
        };

        match req.command {
            SvenCommand::UpDuration | SvenCommand::DownDuration => {
                let ms = self.bounded(value, self.config.max_duration_ms, "ms")
                    .map_err(invalid)?;
                Ok(Command::Duration {
                    direction: direction_of(req.command),
                    ms,
                })
            }
            SvenCommand::UpRelative | SvenCommand::DownRelative => {
                let cm = self.bounded(value, self.config.max_distance_cm, "cm")
                    .map_err(invalid)?;
                Ok(Command::Relative {
                    direction: direction_of(req.command),
                    cm,
                })
            }
            SvenCommand::AbsoluteHeight => {
                let out_of_range = ActuatorError::OutOfRange {
                    value,
                    min: self.config.min_height_mm,
                    max: self.config.max_height_mm,
                };
                let height_mm = u32::try_from(value).map_err(|_| out_of_range.clone())?;
                if !(self.config.min_height_mm..=self.config.max_height_mm).contains(&height_mm) {
                    return Err(out_of_range);
                }
                Ok(Command::Absolute { height_mm })
            }
            SvenCommand::Position => SvenPosition::from_index(value)
                .map(Command::Position)
                .ok_or(ActuatorError::UnknownPreset(value)),
        }
    }

    fn bounded(&self, value: i64, max: i64, unit: &str) -> Result<u32, String> {
        if value <= 0 {
            return Err("must be positive".to_string());
        }
        if value > max {
            return Err(format!("exceeds limit of {}{}", max, unit));
        }
        u32::try_from(value).map_err(|_| format!("exceeds limit of {}{}", max, unit))
    }
}

fn direction_of(cmd: SvenCommand) -> crate::protocol::Direction {
    cmd.direction().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Direction;

    fn req(command: SvenCommand, value: i64) -> CommandRequest {
        CommandRequest::new(command, value)
    }

    #[test]
    fn accepts_duration_within_limit() {
        let v = CommandValidator::default();
        assert_eq!(
            v.validate(&req(SvenCommand::DownDuration, 5000)),
            Ok(Command::Duration { direction: Direction::Down, ms: 5000 })
        );
    }

    #[test]
    fn rejects_non_positive_and_oversized_duration() {
        let v = CommandValidator::default();
        assert!(matches!(
            v.validate(&req(SvenCommand::UpDuration, 0)),
            Err(ActuatorError::InvalidValue { .. })
        ));
        assert!(v.validate(&req(SvenCommand::UpDuration, -10)).is_err());
        assert!(v.validate(&req(SvenCommand::UpDuration, 30_001)).is_err());
    }

    #[test]
    fn relative_is_in_centimeters() {
        let v = CommandValidator::default();
        assert_eq!(
            v.validate(&req(SvenCommand::UpRelative, 30)),
            Ok(Command::Relative { direction: Direction::Up, cm: 30 })
        );
        assert!(v.validate(&req(SvenCommand::UpRelative, 66)).is_err());
    }

    #[test]
    fn absolute_honors_travel_range() {
        let v = CommandValidator::default();
        assert_eq!(
            v.validate(&req(SvenCommand::AbsoluteHeight, 622)),
            Ok(Command::Absolute { height_mm: 622 })
        );
        assert_eq!(
            v.validate(&req(SvenCommand::AbsoluteHeight, 1274)),
            Ok(Command::Absolute { height_mm: 1274 })
        );
        assert_eq!(
            v.validate(&req(SvenCommand::AbsoluteHeight, 621)),
            Err(ActuatorError::OutOfRange { value: 621, min: 622, max: 1274 })
        );
        assert!(v.validate(&req(SvenCommand::AbsoluteHeight, -1)).is_err());
    }

    #[test]
    fn position_takes_preset_index() {
        let v = CommandValidator::default();
        assert_eq!(
            v.validate(&req(SvenCommand::Position, 4)),
            Ok(Command::Position(SvenPosition::Standing))
        );
        assert_eq!(
            v.validate(&req(SvenCommand::Position, 5)),
            Err(ActuatorError::UnknownPreset(5))
        );
    }
}
