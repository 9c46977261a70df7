//! Phase notifications emitted while a probe runs
//!
//! Notifications are observational only: observers cannot influence the
//! lifecycle, and a failing observer (e.g. a dropped channel receiver) is
//! ignored.

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Lifecycle phase reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbePhase {
    Connecting,
    Connected,
    SessionCreated,
    Reading,
    ReadSuccessful,
    Disconnected,
    /// Connect, session or read failed
    Failed,
    /// Validation failure or unexpected fault
    Error,
}

impl ProbePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbePhase::Connecting => "connecting",
            ProbePhase::Connected => "connected",
            ProbePhase::SessionCreated => "session-created",
            ProbePhase::Reading => "reading",
            ProbePhase::ReadSuccessful => "read-successful",
            ProbePhase::Disconnected => "disconnected",
            ProbePhase::Failed => "failed",
            ProbePhase::Error => "error",
        }
    }

    /// Status text shown by hosts that render progress
    pub fn default_text(&self) -> &'static str {
        match self {
            ProbePhase::Connecting => "Connecting...",
            ProbePhase::Connected => "Connected",
            ProbePhase::SessionCreated => "Session created",
            ProbePhase::Reading => "Reading...",
            ProbePhase::ReadSuccessful => "Read successful",
            ProbePhase::Disconnected => "Disconnected",
            ProbePhase::Failed => "Connection failed",
            ProbePhase::Error => "Error",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbePhase::Failed | ProbePhase::Error)
    }
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable `{phase, text}` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseNotification {
    pub phase: ProbePhase,
    pub text: String,
}

impl PhaseNotification {
    pub fn new(phase: ProbePhase, text: impl Into<String>) -> Self {
        Self {
            phase,
            text: text.into(),
        }
    }
}

impl From<ProbePhase> for PhaseNotification {
    fn from(phase: ProbePhase) -> Self {
        Self::new(phase, phase.default_text())
    }
}

/// Receives phase notifications from a running probe
pub trait PhaseObserver: Send + Sync {
    fn on_phase(&self, notification: &PhaseNotification);
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PhaseObserver for NoopObserver {
    fn on_phase(&self, _notification: &PhaseNotification) {}
}

/// Forwards notifications to the `log` facade at info level
#[derive(Debug, Clone, Default)]
pub struct LogObserver {
    prefix: Option<String>,
}

impl LogObserver {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }
}

impl PhaseObserver for LogObserver {
    fn on_phase(&self, notification: &PhaseNotification) {
        match &self.prefix {
            Some(prefix) => log::info!("{}: [{}] {}", prefix, notification.phase, notification.text),
            None => log::info!("[{}] {}", notification.phase, notification.text),
        }
    }
}

/// Observer backed by a closure
pub struct CallbackObserver<F>
where
    F: Fn(&PhaseNotification) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(&PhaseNotification) + Send + Sync,
{
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> PhaseObserver for CallbackObserver<F>
where
    F: Fn(&PhaseNotification) + Send + Sync,
{
    fn on_phase(&self, notification: &PhaseNotification) {
        (self.callback)(notification);
    }
}

impl PhaseObserver for UnboundedSender<PhaseNotification> {
    fn on_phase(&self, notification: &PhaseNotification) {
        // The receiver may already be gone.
        let _ = self.send(notification.clone());
    }
}

/// Create a channel whose sender is a [`PhaseObserver`]
pub fn phase_channel() -> (UnboundedSender<PhaseNotification>, UnboundedReceiver<PhaseNotification>) {
    tokio::sync::mpsc::unbounded_channel()
}
