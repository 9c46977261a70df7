//! Core types and errors for the OPC UA connection probe
//!
//! This crate provides the error type, security configuration, identifiers and
//! value types shared by the transport abstraction and the probe itself.

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod node_id;
pub mod security;
pub mod variant;

pub use credentials::{Credentials, UserIdentity};
pub use endpoint::{DEFAULT_PORT, EndpointUrl};
pub use error::{ErrorClass, UaError, UaResult};
pub use node_id::{AttributeId, Identifier, NodeId};
pub use security::{MessageSecurityMode, SecurityConfig, SecurityPolicy};
pub use variant::{DataValue, Severity, StatusCode, UaDateTime, Variant};
