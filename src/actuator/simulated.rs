//! In-memory stand-in for the lift column.
//!
//! Moves complete instantly; the returned [`Motion`] says how long the real
//! column would have taken so the caller can hold the actuator for that long.

use std::time::Duration;
use tracing::debug;

use crate::actuator::config::{PresetHeights, ServerConfig};
use crate::actuator::error::ActuatorError;
use crate::actuator::{Actuator, Command, Motion};
use crate::protocol::{Direction, SvenPosition, SvenState};

#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    height_mm: u32,
    min_height_mm: u32,
    max_height_mm: u32,
    speed_mm_per_s: u32,
    tolerance_mm: u32,
    presets: PresetHeights,
}

impl SimulatedActuator {
    pub fn new(cfg: &ServerConfig) -> Self {
        Self {
            height_mm: cfg
                .initial_height_mm
                .clamp(cfg.min_height_mm, cfg.max_height_mm),
            min_height_mm: cfg.min_height_mm,
            max_height_mm: cfg.max_height_mm,
            speed_mm_per_s: cfg.speed_mm_per_s.max(1),
            tolerance_mm: cfg.position_tolerance_mm,
            presets: cfg.presets.clone(),
        }
    }

    /// Preset matching `height_mm` within tolerance, nearest first.
    fn resolve_position(&self, height_mm: u32) -> SvenPosition {
        SvenPosition::PRESETS
            .iter()
            .filter_map(|p| self.presets.height_of(*p).map(|h| (*p, h.abs_diff(height_mm))))
            .filter(|(_, diff)| *diff <= self.tolerance_mm)
            .min_by_key(|(_, diff)| *diff)
            .map(|(p, _)| p)
            .unwrap_or(SvenPosition::Custom)
    }

    fn step(&self, direction: Direction, travel_mm: u32) -> u32 {
        match direction {
            Direction::Up => self.height_mm.saturating_add(travel_mm).min(self.max_height_mm),
            Direction::Down => self.height_mm.saturating_sub(travel_mm).max(self.min_height_mm),
        }
    }

    fn travel_time(&self, from_mm: u32, to_mm: u32) -> Duration {
        let travel = u64::from(from_mm.abs_diff(to_mm));
        Duration::from_millis(travel * 1000 / u64::from(self.speed_mm_per_s))
    }
}

impl Actuator for SimulatedActuator {
    fn state(&self) -> SvenState {
        SvenState {
            height_mm: self.height_mm,
            position: self.resolve_position(self.height_mm),
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Motion, ActuatorError> {
        let from_mm = self.height_mm;
        let (to_mm, duration) = match *command {
            Command::Duration { direction, ms } => {
                let travel = u64::from(self.speed_mm_per_s) * u64::from(ms) / 1000;
                let travel = u32::try_from(travel).unwrap_or(u32::MAX);
                (self.step(direction, travel), Duration::from_millis(u64::from(ms)))
            }
            Command::Relative { direction, cm } => {
                let to = self.step(direction, cm.saturating_mul(10));
                (to, self.travel_time(from_mm, to))
            }
            Command::Absolute { height_mm } => {
                if !(self.min_height_mm..=self.max_height_mm).contains(&height_mm) {
                    return Err(ActuatorError::OutOfRange {
                        value: i64::from(height_mm),
                        min: self.min_height_mm,
                        max: self.max_height_mm,
                    });
                }
                (height_mm, self.travel_time(from_mm, height_mm))
            }
            Command::Position(position) => {
                let target = self.presets.height_of(position).ok_or_else(|| {
                    ActuatorError::UnknownPreset(
                        position.index().map(|i| i as i64).unwrap_or(-1),
                    )
                })?;
                (target, self.travel_time(from_mm, target))
            }
        };

        self.height_mm = to_mm;
        debug!(from_mm, to_mm, duration_ms = duration.as_millis() as u64, "simulated move");
        Ok(Motion {
            from_mm,
            to_mm,
            duration,
        })
    }
}
