pub mod audit;
pub mod config;
pub mod error;
pub mod simulated;
pub mod validator;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::protocol::{CommandRequest, Direction, SvenPosition, SvenState};
use audit::AuditLogger;
use config::ServerConfig;
pub use error::ActuatorError;
pub use simulated::SimulatedActuator;
pub use validator::{CommandValidator, ValidatorConfig};

/// A validated motor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Duration { direction: Direction, ms: u32 },
    Relative { direction: Direction, cm: u32 },
    Absolute { height_mm: u32 },
    Position(SvenPosition),
}

impl Command {
    /// Human readable summary used in the success message.
    pub fn describe(&self) -> String {
        match self {
            Command::Duration { direction, ms } => format!("Sven moving {} for {}ms", direction, ms),
            Command::Relative { direction, cm } => format!("Sven moving {} {}cm", direction, cm),
            Command::Absolute { height_mm } => format!("Sven moving to {}mm", height_mm),
            Command::Position(p) => format!("Sven moving to {}", p.label()),
        }
    }
}

/// Outcome of one executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub from_mm: u32,
    pub to_mm: u32,
    pub duration: Duration,
}

/// Motor driver seam. The endpoint only needs to read state and run one
/// validated command at a time.
pub trait Actuator: Send + Sync {
    fn state(&self) -> SvenState;
    fn execute(&mut self, command: &Command) -> Result<Motion, ActuatorError>;
}

pub type StateStore = Arc<RwLock<SvenState>>;

/// Serializes access to an [`Actuator`]. Overlapping commands are rejected
/// with [`ActuatorError::Busy`] rather than queued.
#[derive(Clone)]
pub struct ActuatorController {
    actuator: Arc<Mutex<Box<dyn Actuator>>>,
    state: StateStore,
    validator: CommandValidator,
    audit: AuditLogger,
    realtime: bool,
}

impl ActuatorController {
    pub fn new(actuator: Box<dyn Actuator>, validator: CommandValidator, realtime: bool) -> Self {
        let state = Arc::new(RwLock::new(actuator.state()));
        Self {
            actuator: Arc::new(Mutex::new(actuator)),
            state,
            validator,
            audit: AuditLogger::new(),
            realtime,
        }
    }

    pub fn simulated(cfg: &ServerConfig) -> Self {
        Self::new(
            Box::new(SimulatedActuator::new(cfg)),
            CommandValidator::new(ValidatorConfig::from(cfg)),
            cfg.realtime,
        )
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Last reported state. Never waits for a move in progress.
    pub async fn state(&self) -> SvenState {
        *self.state.read().await
    }

    pub async fn execute(&self, req: &CommandRequest) -> Result<(Command, Motion, SvenState), ActuatorError> {
        self.audit.command_received(req);

        let command = self.validator.validate(req).inspect_err(|e| {
            self.audit.command_rejected(req, &e.to_string());
        })?;

        let mut guard = match Arc::clone(&self.actuator).try_lock_owned() {
            Ok(g) => g,
            Err(_) => {
                self.audit.actuator_busy(req);
                return Err(ActuatorError::Busy);
            }
        };

        let motion = guard.execute(&command).inspect_err(|e| {
            self.audit.command_rejected(req, &e.to_string());
        })?;
        let state = guard.state();

        // The hold task owns the guard, so a dropped request cannot free the
        // actuator while the move is still running.
        let hold = if self.realtime && !motion.duration.is_zero() {
            debug!(duration_ms = motion.duration.as_millis() as u64, "holding actuator for move");
            Some(hold_for(guard, motion.duration))
        } else {
            drop(guard);
            None
        };

        {
            let mut store = self.state.write().await;
            *store = state;
        }
        self.audit.command_executed(req, motion.from_mm, &state);

        if let Some(hold) = hold {
            let _ = hold.await;
        }

        Ok((command, motion, state))
    }
}

fn hold_for(guard: OwnedMutexGuard<Box<dyn Actuator>>, duration: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        drop(guard);
        trace!("actuator released");
    })
}

impl std::fmt::Debug for ActuatorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorController")
            .field("realtime", &self.realtime)
            .finish_non_exhaustive()
    }
}
