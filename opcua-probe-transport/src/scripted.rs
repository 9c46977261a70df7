//! Scripted in-memory protocol stack
//!
//! Simulates server behaviour (reachable, refusing, hanging, rejecting
//! credentials, failing reads) without a real server, and records every
//! primitive call so lifecycle guarantees can be checked afterwards.

use crate::client::{ClientFactory, ClientOptions, UaClient, UaSession};
use crate::strategy::connect_with_retry;
use async_trait::async_trait;
use opcua_probe_core::{
    AttributeId, Credentials, DataValue, EndpointUrl, NodeId, UaDateTime, UaError, UaResult,
    UserIdentity, Variant,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// How `connect` behaves
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectBehavior {
    Accept,
    /// Refuse the first `n` attempts with a transient error, then accept
    RefuseTimes(u32),
    /// Refuse every attempt with the given message
    Refuse(String),
    /// Never complete
    Hang,
    /// Hang on the first `n` attempts, then accept
    HangTimes(u32),
}

/// How `create_session` behaves
#[derive(Debug, Clone, PartialEq)]
pub enum SessionBehavior {
    Accept,
    /// Accept only this user-name identity (anonymous is rejected)
    RequireUser(Credentials),
    Reject(String),
}

/// How `read` behaves
#[derive(Debug, Clone, PartialEq)]
pub enum ReadBehavior {
    Value(DataValue),
    Fail(String),
    /// Unwind out of the stack, as a buggy driver would
    Panic,
}

/// Server behaviour for one scripted stack
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub connect: ConnectBehavior,
    pub session: SessionBehavior,
    pub read: ReadBehavior,
    pub close_error: Option<String>,
    pub disconnect_error: Option<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect: ConnectBehavior::Accept,
            session: SessionBehavior::Accept,
            read: ReadBehavior::Value(DataValue::good(Variant::DateTime(UaDateTime::from_unix_millis(
                1_700_000_000_000,
            )))),
            close_error: None,
            disconnect_error: None,
        }
    }
}

impl Script {
    /// A reachable server that accepts anonymous and user-name sessions
    pub fn reachable() -> Self {
        Self::default()
    }

    /// A server that never answers
    pub fn unreachable() -> Self {
        Self {
            connect: ConnectBehavior::Hang,
            ..Self::default()
        }
    }

    pub fn connect(mut self, behavior: ConnectBehavior) -> Self {
        self.connect = behavior;
        self
    }

    pub fn session(mut self, behavior: SessionBehavior) -> Self {
        self.session = behavior;
        self
    }

    pub fn read(mut self, behavior: ReadBehavior) -> Self {
        self.read = behavior;
        self
    }

    pub fn close_error(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    pub fn disconnect_error(mut self, message: impl Into<String>) -> Self {
        self.disconnect_error = Some(message.into());
        self
    }
}

/// Everything the stack was asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRecord {
    pub clients_created: u32,
    pub options: Vec<ClientOptions>,
    pub connect_attempts: u32,
    pub connects_completed: u32,
    pub session_requests: Vec<UserIdentity>,
    pub sessions_created: u32,
    pub reads: Vec<(NodeId, AttributeId)>,
    pub session_closes: u32,
    pub disconnects: u32,
}

/// Scripted stack; cheap to clone, clones share the call record
#[derive(Debug, Clone)]
pub struct ScriptedStack {
    script: Arc<Script>,
    record: Arc<Mutex<CallRecord>>,
}

impl ScriptedStack {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            record: Arc::new(Mutex::new(CallRecord::default())),
        }
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> CallRecord {
        lock(&self.record).clone()
    }
}

fn lock(record: &Mutex<CallRecord>) -> MutexGuard<'_, CallRecord> {
    // A panic inside a scripted read must not hide the calls recorded before it.
    record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ClientFactory for ScriptedStack {
    fn create(&self, options: &ClientOptions) -> UaResult<Box<dyn UaClient>> {
        {
            let mut record = lock(&self.record);
            record.clients_created += 1;
            record.options.push(options.clone());
        }
        Ok(Box::new(ScriptedClient {
            script: Arc::clone(&self.script),
            record: Arc::clone(&self.record),
            options: options.clone(),
            connected: false,
        }))
    }
}

struct ScriptedClient {
    script: Arc<Script>,
    record: Arc<Mutex<CallRecord>>,
    options: ClientOptions,
    connected: bool,
}

impl ScriptedClient {
    async fn attempt(&self, endpoint: &EndpointUrl, attempt: u32) -> UaResult<()> {
        lock(&self.record).connect_attempts += 1;
        match &self.script.connect {
            ConnectBehavior::Accept => Ok(()),
            ConnectBehavior::RefuseTimes(n) if attempt >= *n => Ok(()),
            ConnectBehavior::RefuseTimes(_) => Err(UaError::Connection(format!(
                "connect ECONNREFUSED {}",
                endpoint.socket_address()
            ))),
            ConnectBehavior::Refuse(message) => Err(UaError::Connection(message.clone())),
            ConnectBehavior::HangTimes(n) if attempt >= *n => Ok(()),
            ConnectBehavior::Hang | ConnectBehavior::HangTimes(_) => {
                std::future::pending::<UaResult<()>>().await
            }
        }
    }
}

#[async_trait]
impl UaClient for ScriptedClient {
    async fn connect(&mut self, endpoint: &EndpointUrl) -> UaResult<()> {
        let strategy = self.options.connect_strategy.clone();
        connect_with_retry(&strategy, |attempt| self.attempt(endpoint, attempt)).await?;
        self.connected = true;
        lock(&self.record).connects_completed += 1;
        Ok(())
    }

    async fn create_session(&mut self, identity: &UserIdentity) -> UaResult<Box<dyn UaSession>> {
        lock(&self.record).session_requests.push(identity.clone());
        if !self.connected {
            return Err(UaError::Session("client is not connected".to_string()));
        }

        match (&self.script.session, identity) {
            (SessionBehavior::Accept, _) => {}
            (SessionBehavior::RequireUser(expected), UserIdentity::UserName(given)) if expected == given => {}
            (SessionBehavior::RequireUser(_), _) => {
                return Err(UaError::Session("BadUserAccessDenied".to_string()));
            }
            (SessionBehavior::Reject(message), _) => return Err(UaError::Session(message.clone())),
        }

        lock(&self.record).sessions_created += 1;
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
            record: Arc::clone(&self.record),
        }))
    }

    async fn disconnect(&mut self) -> UaResult<()> {
        lock(&self.record).disconnects += 1;
        self.connected = false;
        match &self.script.disconnect_error {
            Some(message) => Err(UaError::Teardown(message.clone())),
            None => Ok(()),
        }
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    record: Arc<Mutex<CallRecord>>,
}

#[async_trait]
impl UaSession for ScriptedSession {
    async fn read(&mut self, node: &NodeId, attribute: AttributeId) -> UaResult<DataValue> {
        lock(&self.record).reads.push((node.clone(), attribute));
        match &self.script.read {
            ReadBehavior::Value(value) => Ok(value.clone()),
            ReadBehavior::Fail(message) => Err(UaError::Read(message.clone())),
            ReadBehavior::Panic => panic!("scripted read panicked on {}", node),
        }
    }

    async fn close(&mut self) -> UaResult<()> {
        lock(&self.record).session_closes += 1;
        match &self.script.close_error {
            Some(message) => Err(UaError::Teardown(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ConnectStrategy;
    use opcua_probe_core::SecurityConfig;

    fn endpoint() -> EndpointUrl {
        EndpointUrl::parse("opc.tcp://localhost:4840").unwrap()
    }

    #[tokio::test]
    async fn test_reachable_round_trip() {
        let stack = ScriptedStack::new(Script::reachable());
        let mut client = stack.create(&ClientOptions::new(SecurityConfig::default())).unwrap();
        client.connect(&endpoint()).await.unwrap();
        let mut session = client.create_session(&UserIdentity::Anonymous).await.unwrap();
        let value = session
            .read(&NodeId::SERVER_STATUS_CURRENT_TIME, AttributeId::Value)
            .await
            .unwrap();
        assert!(matches!(value.value, Variant::DateTime(_)));
        session.close().await.unwrap();
        client.disconnect().await.unwrap();

        let calls = stack.calls();
        assert_eq!(calls.clients_created, 1);
        assert_eq!(calls.connect_attempts, 1);
        assert_eq!(calls.sessions_created, 1);
        assert_eq!(calls.session_closes, 1);
        assert_eq!(calls.disconnects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refuse_times_uses_strategy() {
        let stack = ScriptedStack::new(Script::reachable().connect(ConnectBehavior::RefuseTimes(2)));
        let options = ClientOptions::new(SecurityConfig::default())
            .connect_strategy(ConnectStrategy::default().with_max_retry(2));
        let mut client = stack.create(&options).unwrap();
        client.connect(&endpoint()).await.unwrap();
        assert_eq!(stack.calls().connect_attempts, 3);
        assert_eq!(stack.calls().connects_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_times_recovers_on_retry() {
        let stack = ScriptedStack::new(Script::reachable().connect(ConnectBehavior::HangTimes(1)));
        let strategy = ConnectStrategy::default()
            .with_max_retry(1)
            .with_attempt_timeout(std::time::Duration::from_millis(500));
        let mut client = stack
            .create(&ClientOptions::new(SecurityConfig::default()).connect_strategy(strategy))
            .unwrap();

        client.connect(&endpoint()).await.unwrap();
        assert_eq!(stack.calls().connect_attempts, 2);
    }

    #[tokio::test]
    async fn test_session_requires_connection() {
        let stack = ScriptedStack::new(Script::reachable());
        let mut client = stack.create(&ClientOptions::new(SecurityConfig::default())).unwrap();
        assert!(client.create_session(&UserIdentity::Anonymous).await.is_err());
    }

    #[tokio::test]
    async fn test_require_user_rejects_wrong_password() {
        let expected = Credentials::new("operator", "secret");
        let stack = ScriptedStack::new(Script::reachable().session(SessionBehavior::RequireUser(expected)));
        let mut client = stack.create(&ClientOptions::new(SecurityConfig::default())).unwrap();
        client.connect(&endpoint()).await.unwrap();

        let wrong = UserIdentity::UserName(Credentials::new("operator", "guess"));
        assert!(client.create_session(&wrong).await.is_err());
        assert!(client.create_session(&UserIdentity::Anonymous).await.is_err());
        assert_eq!(stack.calls().sessions_created, 0);
    }
}
