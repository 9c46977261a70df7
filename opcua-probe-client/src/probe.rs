//! Connection probe
//!
//! Runs one connect / session / read round trip against an OPC UA endpoint and
//! reports a [`ProbeResult`].
//!
//! # Lifecycle
//!
//! 1. **Resolve**: merge the request over the configured defaults
//! 2. **Validate**: resolve the security policy and mode keys; an unknown key
//!    ends the invocation with `error` before anything is opened
//! 3. **Connect**: construct a client and connect; each attempt is bounded by
//!    the timeout and retried per the connect strategy
//! 4. **Session**: anonymous when unsecured, user-name otherwise
//! 5. **Read**: `Server_ServerStatus_CurrentTime.Value`
//! 6. **Teardown**: close the session and disconnect, exactly once, whatever
//!    happened above
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use opcua_probe_client::{ConnectionProbe, LogObserver, ProbeRequest};
//! use opcua_probe_transport::{Script, ScriptedStack};
//!
//! # async fn demo() {
//! let probe = ConnectionProbe::new(ScriptedStack::new(Script::reachable()));
//! let request = ProbeRequest::new().endpoint("opc.tcp://plc-7:4840");
//! let result = probe.run(&request, &LogObserver::default()).await;
//! println!("{}", result.message);
//! # }
//! ```

use crate::phase::{PhaseNotification, PhaseObserver, ProbePhase};
use crate::request::{ProbeDefaults, ProbeRequest, ResolvedRequest};
use crate::result::{CredentialDisclosure, ProbeResult};
use crate::state::ProbeState;
use crate::teardown::TeardownGuard;
use futures::FutureExt;
use opcua_probe_core::{
    AttributeId, DataValue, EndpointUrl, NodeId, SecurityConfig, UaError, UaResult, UserIdentity,
};
use opcua_probe_transport::{ClientFactory, ClientOptions};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Node read to verify that a session is functional
pub const VERIFICATION_NODE: NodeId = NodeId::SERVER_STATUS_CURRENT_TIME;

/// Connection-and-session lifecycle probe
///
/// Cheap to clone. Clones share the configured defaults and the client
/// factory, both read-only, so any number of invocations may run concurrently.
#[derive(Clone)]
pub struct ConnectionProbe {
    name: Option<String>,
    defaults: Arc<ProbeDefaults>,
    factory: Arc<dyn ClientFactory>,
}

impl ConnectionProbe {
    pub fn new(factory: impl ClientFactory + 'static) -> Self {
        Self {
            name: None,
            defaults: Arc::new(ProbeDefaults::default()),
            factory: Arc::new(factory),
        }
    }

    /// Name used as a prefix on warnings
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_defaults(mut self, defaults: ProbeDefaults) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn defaults(&self) -> &ProbeDefaults {
        &self.defaults
    }

    /// Run one probe
    ///
    /// Always returns a result: every failure, including a panic inside the
    /// protocol stack, is converted into a `failed` or `error` result. Any
    /// session or connection opened here has been released by the time this
    /// returns.
    pub async fn run(&self, request: &ProbeRequest, observer: &dyn PhaseObserver) -> ProbeResult {
        let resolved = request.resolve(&self.defaults);
        log::debug!(
            "Connecting to {} with policy {} and mode {}",
            resolved.endpoint,
            resolved.security_policy,
            resolved.security_mode
        );

        let has_credentials = resolved.credentials.is_some();
        let security = match SecurityConfig::resolve(&resolved.security_policy, &resolved.security_mode) {
            Ok(security) => security,
            Err(err) => {
                self.warn(format_args!("OPC UA probe configuration error: {}", err));
                observer.on_phase(&PhaseNotification::new(ProbePhase::Error, err.to_string()));
                return ProbeResult::error(&resolved, CredentialDisclosure::classify(None, has_credentials), &err);
            }
        };
        let disclosure = CredentialDisclosure::classify(Some(&security), has_credentials);

        let mut state = ProbeState::Validating;
        let mut guard = TeardownGuard::new();
        let outcome = AssertUnwindSafe(self.drive(&resolved, security, &mut guard, &mut state, observer))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(UaError::Internal(panic_message(panic))));

        let mut result = match outcome {
            Ok(value) => {
                log::debug!("Read test value: {}", value.value);
                notify(observer, ProbePhase::ReadSuccessful);
                ProbeResult::connected(&resolved, disclosure, value.value)
            }
            Err(err) => {
                let failed_in = state.fail();
                self.warn(format_args!("OPC UA connection error while {}: {}", failed_in, err));
                if let UaError::Internal(_) = err {
                    observer.on_phase(&PhaseNotification::new(ProbePhase::Error, err.to_string()));
                    ProbeResult::error(&resolved, disclosure, &err)
                } else {
                    notify(observer, ProbePhase::Failed);
                    ProbeResult::failed(&resolved, disclosure, &err)
                }
            }
        };

        let report = guard.release().await;
        if report.disconnected {
            notify(observer, ProbePhase::Disconnected);
        }
        for err in report.errors {
            self.warn(format_args!("OPC UA teardown error: {}", err));
            result.teardown_warnings.push(err.to_string());
        }

        log::info!("Probe of {} finished: {}", result.endpoint, result.status);
        result
    }

    async fn drive(
        &self,
        resolved: &ResolvedRequest,
        security: SecurityConfig,
        guard: &mut TeardownGuard,
        state: &mut ProbeState,
        observer: &dyn PhaseObserver,
    ) -> UaResult<DataValue> {
        state.advance(ProbeState::Connecting)?;
        notify(observer, ProbePhase::Connecting);

        let options = ClientOptions::new(security)
            .application_name(resolved.application_name.clone())
            .connect_strategy(resolved.connect_strategy.clone())
            .endpoint_must_exist(false);
        let client = guard.attach_client(self.factory.create(&options)?);
        let endpoint = EndpointUrl::parse(&resolved.endpoint)?;

        // The stack bounds each attempt; this outer race only catches stacks
        // that ignore the strategy. Dropping the future abandons the attempt.
        let deadline = resolved.connect_strategy.worst_case().unwrap_or(resolved.timeout);
        tokio::time::timeout(deadline, client.connect(&endpoint))
            .await
            .map_err(|_| UaError::Timeout)??;
        log::debug!("Connected to {}", endpoint);
        notify(observer, ProbePhase::Connected);

        state.advance(ProbeState::CreatingSession)?;
        let identity = if security.is_unsecured() {
            UserIdentity::Anonymous
        } else {
            match &resolved.credentials {
                Some(credentials) => UserIdentity::UserName(credentials.clone()),
                None => return Err(UaError::MissingCredentials),
            }
        };
        let session = client.create_session(&identity).await?;
        let session = guard.attach_session(session);
        log::debug!("Session created successfully");
        notify(observer, ProbePhase::SessionCreated);

        state.advance(ProbeState::Reading)?;
        notify(observer, ProbePhase::Reading);
        let value = session.read(&VERIFICATION_NODE, AttributeId::Value).await?;
        if value.status.is_bad() {
            return Err(UaError::Read(format!("{} returned {}", VERIFICATION_NODE, value.status)));
        }

        state.advance(ProbeState::Succeeded)?;
        Ok(value)
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        match &self.name {
            Some(name) => log::warn!("{}: {}", name, message),
            None => log::warn!("{}", message),
        }
    }
}

impl fmt::Debug for ConnectionProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProbe")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

fn notify(observer: &dyn PhaseObserver, phase: ProbePhase) {
    log::debug!("Probe phase: {}", phase);
    observer.on_phase(&phase.into());
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("protocol stack panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("protocol stack panicked: {}", message)
    } else {
        "protocol stack panicked".to_string()
    }
}
