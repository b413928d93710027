//! Wire contract between the control client and the actuator endpoint.
//!
//! Tag strings (`UpDuration`, `AbsoluteHeight`, ...) and position names are
//! part of the contract with deployed clients and must not be renamed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub const COMMAND_PATH: &str = "/api/sven/command";
pub const STATE_PATH: &str = "/api/sven/state";

/// Command family picked by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveMode {
    Duration,
    Relative,
    Absolute,
    Position,
}

impl MoveMode {
    /// Whether commands of this family need a direction.
    pub fn is_directional(self) -> bool {
        matches!(self, MoveMode::Duration | MoveMode::Relative)
    }
}

impl fmt::Display for MoveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveMode::Duration => "Duration",
            MoveMode::Relative => "Relative",
            MoveMode::Absolute => "Absolute",
            MoveMode::Position => "Position",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("Up"),
            Direction::Down => f.write_str("Down"),
        }
    }
}

/// Command tag sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SvenCommand {
    UpDuration,
    DownDuration,
    UpRelative,
    DownRelative,
    AbsoluteHeight,
    Position,
}

impl SvenCommand {
    /// Derive the tag for a mode. `direction` is ignored for Absolute and Position.
    pub fn for_mode(mode: MoveMode, direction: Direction) -> Self {
        match (mode, direction) {
            (MoveMode::Duration, Direction::Up) => SvenCommand::UpDuration,
            (MoveMode::Duration, Direction::Down) => SvenCommand::DownDuration,
            (MoveMode::Relative, Direction::Up) => SvenCommand::UpRelative,
            (MoveMode::Relative, Direction::Down) => SvenCommand::DownRelative,
            (MoveMode::Absolute, _) => SvenCommand::AbsoluteHeight,
            (MoveMode::Position, _) => SvenCommand::Position,
        }
    }

    pub fn mode(self) -> MoveMode {
        match self {
            SvenCommand::UpDuration | SvenCommand::DownDuration => MoveMode::Duration,
            SvenCommand::UpRelative | SvenCommand::DownRelative => MoveMode::Relative,
            SvenCommand::AbsoluteHeight => MoveMode::Absolute,
            SvenCommand::Position => MoveMode::Position,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            SvenCommand::UpDuration | SvenCommand::UpRelative => Some(Direction::Up),
            SvenCommand::DownDuration | SvenCommand::DownRelative => Some(Direction::Down),
            SvenCommand::AbsoluteHeight | SvenCommand::Position => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SvenCommand::UpDuration => "UpDuration",
            SvenCommand::DownDuration => "DownDuration",
            SvenCommand::UpRelative => "UpRelative",
            SvenCommand::DownRelative => "DownRelative",
            SvenCommand::AbsoluteHeight => "AbsoluteHeight",
            SvenCommand::Position => "Position",
        }
    }
}

impl fmt::Display for SvenCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named preset heights. `Custom` is reported when no preset matches and is
/// never a valid target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SvenPosition {
    Bottom,
    Top,
    ArmRest,
    AboveArmrest,
    Standing,
    Custom,
}

impl SvenPosition {
    /// Targetable presets in index order (the value sent with `Position`).
    pub const PRESETS: [SvenPosition; 5] = [
        SvenPosition::Bottom,
        SvenPosition::Top,
        SvenPosition::ArmRest,
        SvenPosition::AboveArmrest,
        SvenPosition::Standing,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::PRESETS.get(i).copied())
    }

    pub fn index(self) -> Option<usize> {
        Self::PRESETS.iter().position(|p| *p == self)
    }

    pub fn label(self) -> &'static str {
        match self {
            SvenPosition::Bottom => "Bottom",
            SvenPosition::Top => "Top",
            SvenPosition::ArmRest => "Arm Rest",
            SvenPosition::AboveArmrest => "Above Armrest",
            SvenPosition::Standing => "Standing",
            SvenPosition::Custom => "Custom",
        }
    }
}

impl fmt::Display for SvenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: SvenCommand,
    pub value: i64,
}

impl CommandRequest {
    pub fn new(command: SvenCommand, value: i64) -> Self {
        Self { command, value }
    }

    /// Parse either request shape. The legacy `{direction, duration}` body is
    /// normalized to a duration command.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_slice(body)?;
        if raw.get("command").is_some() {
            return serde_json::from_value(raw);
        }
        if raw.get("direction").is_some() {
            let legacy: LegacyCommandRequest = serde_json::from_value(raw)?;
            return Ok(legacy.into());
        }
        Err(<serde_json::Error as serde::de::Error>::custom(
            "missing field `command`",
        ))
    }
}

/// Earliest request shape: a direction and a duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCommandRequest {
    pub direction: Direction,
    pub duration: i64,
}

impl From<LegacyCommandRequest> for CommandRequest {
    fn from(legacy: LegacyCommandRequest) -> Self {
        CommandRequest {
            command: SvenCommand::for_mode(MoveMode::Duration, legacy.direction),
            value: legacy.duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvenState {
    #[serde(deserialize_with = "whole_millimeters")]
    pub height_mm: u32,
    pub position: SvenPosition,
}

// Heights are whole millimeters; fractional readings from other endpoints
// are rounded.
fn whole_millimeters<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 || raw > f64::from(u32::MAX) {
        return Err(serde::de::Error::custom(format!(
            "invalid height {}",
            raw
        )));
    }
    Ok(raw.round() as u32)
}

/// Response envelope of the command endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            error: None,
            timestamp: now_rfc3339(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
            timestamp: now_rfc3339(),
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
