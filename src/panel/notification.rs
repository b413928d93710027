//! Transient result notification with an auto-dismiss timer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
    /// Local wall-clock time the notification was raised.
    pub timestamp: String,
}

impl Notification {
    pub fn success(message: Option<&str>) -> Self {
        Self::new(
            NotificationKind::Success,
            format!("Sent: {}", message.unwrap_or("Command sent successfully")),
        )
    }

    pub fn failure(error: impl AsRef<str>) -> Self {
        Self::new(NotificationKind::Error, format!("Failed: {}", error.as_ref()))
    }

    fn new(kind: NotificationKind, text: String) -> Self {
        Self {
            kind,
            text,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            NotificationKind::Success => "Success",
            NotificationKind::Error => "Error",
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    current: Option<Notification>,
}

/// Holds at most one notification. Each `show` cancels the pending dismissal
/// timer and starts a new one; a timer only clears the notification it was
/// started for.
#[derive(Debug)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    timeout: Duration,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl Notifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            timer: Mutex::new(None),
            timeout,
        }
    }

    pub fn current(&self) -> Option<Notification> {
        lock(&self.slot).current.clone()
    }

    /// Replace the current notification. Must be called within a tokio runtime.
    pub fn show(&self, notification: Notification) {
        // timer before slot, held until the new timer is installed
        let mut timer = lock(&self.timer);
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.current = Some(notification);
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut slot = lock(&slot);
            if slot.generation == generation {
                slot.current = None;
                trace!(generation, "notification auto-dismissed");
            }
        });

        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }

    /// Manual dismissal (click).
    pub fn dismiss(&self) {
        let mut timer = lock(&self.timer);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.current = None;
    }

    fn cancel_timer(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TIMEOUT)
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
