//! Control client: mode/direction selection, single-shot command submission
//! and result notifications.
//!
//! ```no_run
//! # async fn demo() {
//! use sven_control::panel::ControlPanel;
//! use sven_control::protocol::{Direction, MoveMode};
//! use sven_control::transport::ClientConfig;
//!
//! let panel = ControlPanel::new(&ClientConfig::from_env());
//! panel.select_mode(MoveMode::Duration);
//! panel.choose_direction(Direction::Up);
//! let shown = panel.submit(5000, None).await;
//! # }
//! ```

pub mod notification;
pub mod poller;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::{CommandRequest, Direction, MoveMode, SvenCommand, SvenState};
use crate::transport::{ClientConfig, SvenClient};
pub use notification::{Notification, NotificationKind, Notifier, DEFAULT_NOTIFICATION_TIMEOUT};
pub use poller::{empty_cache, StateCache, StatePoller, DEFAULT_POLL_INTERVAL};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("a command is already in flight")]
    Busy,
}

/// UI selection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub mode: MoveMode,
    pub direction: Direction,
    /// Value buttons shown; false means the direction choice is shown.
    pub choosing_value: bool,
    pub value: i64,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mode: MoveMode::Duration,
            direction: Direction::Up,
            choosing_value: false,
            value: 0,
        }
    }
}

pub struct ControlPanel {
    client: SvenClient,
    selection: Mutex<Selection>,
    busy: AtomicBool,
    notifier: Notifier,
}

/// Clears the busy flag and resets the selection step on every exit path of
/// a submission, including the submitting future being dropped.
struct BusyGuard<'a> {
    panel: &'a ControlPanel,
}

impl<'a> BusyGuard<'a> {
    fn acquire(panel: &'a ControlPanel) -> Result<Self, PanelError> {
        panel
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PanelError::Busy)?;
        Ok(Self { panel })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.panel.busy.store(false, Ordering::Release);
        self.panel.reset();
    }
}

impl ControlPanel {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_notification_timeout(config, DEFAULT_NOTIFICATION_TIMEOUT)
    }

    pub fn with_notification_timeout(config: &ClientConfig, timeout: Duration) -> Self {
        Self {
            client: SvenClient::new(config),
            selection: Mutex::new(Selection::default()),
            busy: AtomicBool::new(false),
            notifier: Notifier::new(timeout),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn client(&self) -> &SvenClient {
        &self.client
    }

    pub fn selection(&self) -> Selection {
        *self.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn dismiss_notification(&self) {
        self.notifier.dismiss();
    }

    pub fn select_mode(&self, mode: MoveMode) {
        self.lock().mode = mode;
    }

    pub fn choose_direction(&self, direction: Direction) {
        self.notifier.dismiss();
        let mut sel = self.lock();
        sel.direction = direction;
        sel.choosing_value = true;
        sel.value = 0;
    }

    pub fn set_value(&self, value: i64) {
        self.lock().value = value;
    }

    /// Back to the direction choice.
    pub fn reset(&self) {
        self.lock().choosing_value = false;
    }

    pub fn command_for(&self, mode: MoveMode) -> SvenCommand {
        SvenCommand::for_mode(mode, self.lock().direction)
    }

    /// Polled state seeds the slider with the current height.
    pub fn sync_from_state(&self, state: &SvenState) {
        self.lock().value = i64::from(state.height_mm);
    }

    /// Send one command for `mode` (or the selected mode) and show the result.
    /// Rejected without a request while another submission is in flight.
    pub async fn submit(&self, value: i64, mode: Option<MoveMode>) -> Result<Notification, PanelError> {
        let _guard = BusyGuard::acquire(self)?;

        let mode = mode.unwrap_or_else(|| self.lock().mode);
        let req = CommandRequest::new(self.command_for(mode), value);
        info!(command = %req.command, value = req.value, "sending command");

        let notification = match self.client.send_command(&req).await {
            Ok(resp) if resp.success => {
                debug!(message = ?resp.message, "command accepted");
                Notification::success(resp.message.as_deref())
            }
            Ok(resp) => {
                let error = resp.error.unwrap_or_else(|| "command rejected".to_string());
                warn!(command = %req.command, "command not accepted: {}", error);
                Notification::failure(error)
            }
            Err(e) => {
                warn!(command = %req.command, "command failed: {}", e);
                Notification::failure(e.to_string())
            }
        };

        self.notifier.show(notification.clone());
        Ok(notification)
    }
}

impl std::fmt::Debug for ControlPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPanel")
            .field("selection", &self.selection())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
