//! Protocol stack primitives consumed by the probe
//!
//! The probe never speaks the wire protocol itself. It constructs a client
//! through a [`ClientFactory`] and drives it through these traits:
//!
//! 1. **Create**: `ClientFactory::create(options)`
//! 2. **Connect**: `UaClient::connect(endpoint)`, honouring the connect strategy
//! 3. **Session**: `UaClient::create_session(identity)`
//! 4. **Read**: `UaSession::read(node, attribute)`
//! 5. **Close**: `UaSession::close()` then `UaClient::disconnect()`
//!
//! Every primitive is fallible and may be slow. Implementations must tolerate
//! `disconnect` being called on a client whose `connect` never completed.

use crate::strategy::ConnectStrategy;
use async_trait::async_trait;
use opcua_probe_core::{AttributeId, DataValue, EndpointUrl, NodeId, SecurityConfig, UaResult, UserIdentity};

/// Client construction options
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Application name announced to the server
    pub application_name: String,
    /// Policy and mode the secure channel must use
    pub security: SecurityConfig,
    /// Retry configuration for `connect`
    pub connect_strategy: ConnectStrategy,
    /// When false, the client does not require the server to advertise an
    /// endpoint that exactly matches the requested security pair
    pub endpoint_must_exist: bool,
}

impl ClientOptions {
    pub fn new(security: SecurityConfig) -> Self {
        Self {
            application_name: "opcua-probe".to_string(),
            security,
            connect_strategy: ConnectStrategy::default(),
            endpoint_must_exist: false,
        }
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    pub fn connect_strategy(mut self, strategy: ConnectStrategy) -> Self {
        self.connect_strategy = strategy;
        self
    }

    pub fn endpoint_must_exist(mut self, must_exist: bool) -> Self {
        self.endpoint_must_exist = must_exist;
        self
    }
}

/// A client bound to one server connection
#[async_trait]
pub trait UaClient: Send {
    /// Open the transport connection and secure channel
    ///
    /// Implementations retry transient failures according to
    /// `ClientOptions::connect_strategy`.
    async fn connect(&mut self, endpoint: &EndpointUrl) -> UaResult<()>;

    /// Create and activate a session
    async fn create_session(&mut self, identity: &UserIdentity) -> UaResult<Box<dyn UaSession>>;

    /// Close the secure channel and transport connection
    async fn disconnect(&mut self) -> UaResult<()>;
}

/// An activated session
#[async_trait]
pub trait UaSession: Send {
    /// Read a single attribute of a single node
    async fn read(&mut self, node: &NodeId, attribute: AttributeId) -> UaResult<DataValue>;

    /// Close the session on the server
    async fn close(&mut self) -> UaResult<()>;
}

/// Builds clients for a protocol stack
pub trait ClientFactory: Send + Sync {
    fn create(&self, options: &ClientOptions) -> UaResult<Box<dyn UaClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&ClientOptions) -> UaResult<Box<dyn UaClient>> + Send + Sync,
{
    fn create(&self, options: &ClientOptions) -> UaResult<Box<dyn UaClient>> {
        self(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_probe_core::{MessageSecurityMode, SecurityPolicy};

    #[test]
    fn test_options_defaults() {
        let options = ClientOptions::new(SecurityConfig::default());
        assert!(!options.endpoint_must_exist);
        assert!(options.security.is_unsecured());
        assert_eq!(options.connect_strategy, ConnectStrategy::default());
    }

    #[test]
    fn test_options_builder() {
        let security = SecurityConfig::new(SecurityPolicy::Basic256Sha256, MessageSecurityMode::Sign);
        let options = ClientOptions::new(security)
            .application_name("line-3-probe")
            .connect_strategy(ConnectStrategy::no_retry())
            .endpoint_must_exist(true);
        assert_eq!(options.application_name, "line-3-probe");
        assert_eq!(options.connect_strategy.max_retry, 0);
        assert!(options.endpoint_must_exist);
        assert_eq!(options.security, security);
    }
}
