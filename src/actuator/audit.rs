use tracing::{info, warn};

use crate::protocol::{CommandRequest, SvenState};

/// Records every command the endpoint sees on the `audit` target.
#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn command_received(&self, req: &CommandRequest) {
        info!(target: "audit", event = "command_received", command = %req.command, value = req.value);
    }

    pub fn command_rejected(&self, req: &CommandRequest, reason: &str) {
        warn!(target: "audit", event = "command_rejected", command = %req.command, value = req.value, reason);
    }

    pub fn malformed_request(&self, reason: &str) {
        warn!(target: "audit", event = "malformed_request", reason);
    }

    pub fn actuator_busy(&self, req: &CommandRequest) {
        warn!(target: "audit", event = "actuator_busy", command = %req.command, value = req.value);
    }

    pub fn command_executed(&self, req: &CommandRequest, from_mm: u32, state: &SvenState) {
        info!(
            target: "audit",
            event = "command_executed",
            command = %req.command,
            value = req.value,
            from_mm,
            to_mm = state.height_mm,
            position = ?state.position
        );
    }
}
