use thiserror::Error;

use crate::protocol::SvenCommand;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// Another command holds the actuator.
    #[error("actuator busy")]
    Busy,

    #[error("invalid value {value} for {command}: {reason}")]
    InvalidValue {
        command: SvenCommand,
        value: i64,
        reason: String,
    },

    #[error("height {value}mm outside travel range {min}..={max}mm")]
    OutOfRange { value: i64, min: u32, max: u32 },

    #[error("unknown position preset {0}")]
    UnknownPreset(i64),
}
