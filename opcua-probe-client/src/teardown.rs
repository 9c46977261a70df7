//! Scoped ownership of the client and session of one invocation
//!
//! [`TeardownGuard`] owns whatever the lifecycle has opened. [`TeardownGuard::release`]
//! closes the session and disconnects the client exactly once. If the guard is
//! dropped without being released (the caller abandoned the probe future), the
//! remaining resources are handed to a task on the current tokio runtime.

use futures::FutureExt;
use opcua_probe_core::UaError;
use opcua_probe_transport::{UaClient, UaSession};
use std::panic::AssertUnwindSafe;

/// What teardown did
#[derive(Debug, Default, PartialEq)]
pub struct TeardownReport {
    /// A session existed and `close` was called on it
    pub session_closed: bool,
    /// A client existed and `disconnect` was called on it
    pub disconnected: bool,
    /// Close/disconnect failures; never change the probe outcome
    pub errors: Vec<UaError>,
}

#[derive(Default)]
pub struct TeardownGuard {
    client: Option<Box<dyn UaClient>>,
    session: Option<Box<dyn UaSession>>,
}

impl TeardownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a freshly constructed client
    pub fn attach_client(&mut self, client: Box<dyn UaClient>) -> &mut dyn UaClient {
        self.client.insert(client).as_mut()
    }

    /// Take ownership of a freshly created session
    pub fn attach_session(&mut self, session: Box<dyn UaSession>) -> &mut dyn UaSession {
        self.session.insert(session).as_mut()
    }

    #[cfg(test)]
    fn has_client(&self) -> bool {
        self.client.is_some()
    }

    #[cfg(test)]
    fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Close the session (if any), then disconnect the client (if any)
    pub async fn release(mut self) -> TeardownReport {
        release_parts(self.session.take(), self.client.take()).await
    }
}

async fn release_parts(
    session: Option<Box<dyn UaSession>>,
    client: Option<Box<dyn UaClient>>,
) -> TeardownReport {
    let mut report = TeardownReport::default();

    if let Some(mut session) = session {
        report.session_closed = true;
        match AssertUnwindSafe(session.close()).catch_unwind().await {
            Ok(Ok(())) => log::debug!("Session closed"),
            Ok(Err(err)) => report.errors.push(err),
            Err(_) => report.errors.push(UaError::Teardown("session close panicked".to_string())),
        }
    }

    if let Some(mut client) = client {
        report.disconnected = true;
        match AssertUnwindSafe(client.disconnect()).catch_unwind().await {
            Ok(Ok(())) => log::debug!("Disconnected"),
            Ok(Err(err)) => report.errors.push(err),
            Err(_) => report.errors.push(UaError::Teardown("disconnect panicked".to_string())),
        }
    }

    report
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if self.session.is_none() && self.client.is_none() {
            return;
        }

        let session = self.session.take();
        let client = self.client.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::debug!("Probe abandoned before teardown; releasing in background");
                handle.spawn(async move {
                    for err in release_parts(session, client).await.errors {
                        log::warn!("Background teardown failed: {}", err);
                    }
                });
            }
            Err(_) => {
                log::error!("Probe abandoned outside a tokio runtime; connection resources were not released");
            }
        }
    }
}
