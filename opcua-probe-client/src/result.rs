//! Probe results

use crate::request::ResolvedRequest;
use opcua_probe_core::{ErrorClass, SecurityConfig, UaError, Variant};
use serde::Serialize;
use std::fmt;

/// Outcome classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Connected, session created and verification read succeeded
    Connected,
    /// Connect, session or read failed
    Failed,
    /// Invalid configuration or an unexpected fault
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeStatus::Connected => "connected",
            ProbeStatus::Failed => "failed",
            ProbeStatus::Error => "error",
        })
    }
}

/// What the result discloses about the credentials used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialDisclosure {
    /// No security, no credentials needed
    Anonymous,
    /// Credentials were supplied
    Provided,
    /// Security is enabled but no credentials were supplied; only ever seen
    /// on a `failed` result
    None,
}

impl CredentialDisclosure {
    /// Classify from the resolved security pair
    ///
    /// `security` is `None` when the policy or mode keys did not resolve; the
    /// classification then only reflects whether credentials were supplied.
    pub fn classify(security: Option<&SecurityConfig>, has_credentials: bool) -> Self {
        match security {
            Some(config) if config.is_unsecured() => CredentialDisclosure::Anonymous,
            _ if has_credentials => CredentialDisclosure::Provided,
            Some(_) => CredentialDisclosure::None,
            None => CredentialDisclosure::Anonymous,
        }
    }
}

/// One result per invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub status: ProbeStatus,
    pub endpoint: String,
    pub security_policy: String,
    pub security_mode: String,
    #[serde(rename = "username")]
    pub credential_disclosure: CredentialDisclosure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_value: Option<Variant>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub message: String,
    /// Errors observed while closing the session or disconnecting
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub teardown_warnings: Vec<String>,
}

impl ProbeResult {
    pub fn connected(request: &ResolvedRequest, disclosure: CredentialDisclosure, value: Variant) -> Self {
        Self {
            status: ProbeStatus::Connected,
            endpoint: request.endpoint.clone(),
            security_policy: request.security_policy.clone(),
            security_mode: request.security_mode.clone(),
            credential_disclosure: disclosure,
            read_value: Some(value),
            error_message: None,
            message: format!("Connection to {} was successful.", request.endpoint),
            teardown_warnings: Vec::new(),
        }
    }

    /// Runtime failure against the server
    pub fn failed(request: &ResolvedRequest, disclosure: CredentialDisclosure, err: &UaError) -> Self {
        let message = format!("Failed to connect or authenticate to {}: {}", request.endpoint, err);
        Self::with_error(ProbeStatus::Failed, request, disclosure, err, message)
    }

    /// Invalid configuration or unexpected fault
    pub fn error(request: &ResolvedRequest, disclosure: CredentialDisclosure, err: &UaError) -> Self {
        let message = match err.class() {
            ErrorClass::Configuration => {
                format!("Invalid probe configuration for {}: {}", request.endpoint, err)
            }
            _ => format!("Probe of {} aborted: {}", request.endpoint, err),
        };
        Self::with_error(ProbeStatus::Error, request, disclosure, err, message)
    }

    fn with_error(
        status: ProbeStatus,
        request: &ResolvedRequest,
        disclosure: CredentialDisclosure,
        err: &UaError,
        message: String,
    ) -> Self {
        Self {
            status,
            endpoint: request.endpoint.clone(),
            security_policy: request.security_policy.clone(),
            security_mode: request.security_mode.clone(),
            credential_disclosure: disclosure,
            read_value: None,
            error_message: Some(err.to_string()),
            message,
            teardown_warnings: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ProbeStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ProbeDefaults, ProbeRequest};
    use opcua_probe_core::{MessageSecurityMode, SecurityPolicy};

    fn resolved() -> ResolvedRequest {
        ProbeRequest::new()
            .endpoint("opc.tcp://host:4840")
            .resolve(&ProbeDefaults::default())
    }

    #[test]
    fn test_classify() {
        let unsecured = SecurityConfig::default();
        let secured = SecurityConfig::new(SecurityPolicy::Basic256Sha256, MessageSecurityMode::SignAndEncrypt);

        assert_eq!(CredentialDisclosure::classify(Some(&unsecured), true), CredentialDisclosure::Anonymous);
        assert_eq!(CredentialDisclosure::classify(Some(&unsecured), false), CredentialDisclosure::Anonymous);
        assert_eq!(CredentialDisclosure::classify(Some(&secured), true), CredentialDisclosure::Provided);
        assert_eq!(CredentialDisclosure::classify(Some(&secured), false), CredentialDisclosure::None);
        assert_eq!(CredentialDisclosure::classify(None, true), CredentialDisclosure::Provided);
        assert_eq!(CredentialDisclosure::classify(None, false), CredentialDisclosure::Anonymous);
    }

    #[test]
    fn test_connected_wire_shape() {
        let result = ProbeResult::connected(&resolved(), CredentialDisclosure::Anonymous, Variant::Int32(42));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["username"], "anonymous");
        assert_eq!(json["readValue"], 42);
        assert_eq!(json["securityPolicy"], "None");
        assert_eq!(json["message"], "Connection to opc.tcp://host:4840 was successful.");
        assert!(json.get("error").is_none());
        assert!(json.get("teardownWarnings").is_none());
    }

    #[test]
    fn test_failed_message_names_endpoint() {
        let result = ProbeResult::failed(&resolved(), CredentialDisclosure::None, &UaError::MissingCredentials);
        assert_eq!(result.status, ProbeStatus::Failed);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Security is enabled but username/password is missing")
        );
        assert!(result.message.contains("opc.tcp://host:4840"));
        assert!(result.message.contains("username/password is missing"));
        assert_eq!(result.read_value, None);
    }

    #[test]
    fn test_error_messages_by_class() {
        let invalid = UaError::InvalidSecurity {
            policy: "NotARealPolicy".into(),
            mode: "None".into(),
        };
        let result = ProbeResult::error(&resolved(), CredentialDisclosure::Anonymous, &invalid);
        assert_eq!(result.status, ProbeStatus::Error);
        assert!(result.message.starts_with("Invalid probe configuration for opc.tcp://host:4840"));

        let internal = ProbeResult::error(
            &resolved(),
            CredentialDisclosure::Anonymous,
            &UaError::Internal("driver panicked".into()),
        );
        assert!(internal.message.starts_with("Probe of opc.tcp://host:4840 aborted"));
        assert_eq!(serde_json::to_value(&internal).unwrap()["status"], "error");
    }
}
