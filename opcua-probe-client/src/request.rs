//! Probe requests, configured defaults and parameter resolution
//!
//! Every field resolves independently: the per-call value wins, then the
//! configured default, then the hardcoded fallback. Empty strings and a zero
//! timeout count as "not supplied".

use opcua_probe_core::Credentials;
use opcua_probe_transport::ConnectStrategy;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "opc.tcp://localhost:4840";
pub const DEFAULT_SECURITY_POLICY: &str = "None";
pub const DEFAULT_SECURITY_MODE: &str = "None";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_RETRY: u32 = 1;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_APPLICATION_NAME: &str = "opcua-probe";

/// Per-call probe parameters
///
/// Deserializes from the inbound message payload (camelCase keys, `timeout`
/// in milliseconds).
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeRequest {
    pub endpoint: Option<String>,
    pub security_policy: Option<String>,
    pub security_mode: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connect timeout in milliseconds
    pub timeout: Option<u64>,
    pub max_retry: Option<u32>,
}

impl ProbeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn security(mut self, policy: impl Into<String>, mode: impl Into<String>) -> Self {
        self.security_policy = Some(policy.into());
        self.security_mode = Some(mode.into());
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = Some(max_retry);
        self
    }

    /// Merge this request over `defaults`
    pub fn resolve(&self, defaults: &ProbeDefaults) -> ResolvedRequest {
        let username = pick(self.username.as_deref(), defaults.username.as_deref());
        let password = pick(self.password.as_deref(), defaults.password.as_deref());

        let timeout_ms = self
            .timeout
            .filter(|t| *t > 0)
            .or(defaults.timeout.filter(|t| *t > 0))
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let strategy = ConnectStrategy::default()
            .with_max_retry(self.max_retry.or(defaults.max_retry).unwrap_or(DEFAULT_MAX_RETRY))
            .with_delays(
                Duration::from_millis(defaults.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY_MS)),
                Duration::from_millis(defaults.max_delay.unwrap_or(DEFAULT_MAX_DELAY_MS)),
            )
            .with_attempt_timeout(Duration::from_millis(timeout_ms));

        ResolvedRequest {
            endpoint: pick(self.endpoint.as_deref(), defaults.endpoint.as_deref())
                .unwrap_or(DEFAULT_ENDPOINT)
                .to_string(),
            security_policy: pick(self.security_policy.as_deref(), defaults.security_policy.as_deref())
                .unwrap_or(DEFAULT_SECURITY_POLICY)
                .to_string(),
            security_mode: pick(self.security_mode.as_deref(), defaults.security_mode.as_deref())
                .unwrap_or(DEFAULT_SECURITY_MODE)
                .to_string(),
            credentials: Credentials::from_parts(username, password),
            timeout: Duration::from_millis(timeout_ms),
            connect_strategy: strategy,
            application_name: defaults
                .application_name
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_APPLICATION_NAME)
                .to_string(),
        }
    }
}

fn pick<'a>(call: Option<&'a str>, configured: Option<&'a str>) -> Option<&'a str> {
    call.filter(|v| !v.is_empty())
        .or(configured.filter(|v| !v.is_empty()))
}

impl fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRequest")
            .field("endpoint", &self.endpoint)
            .field("security_policy", &self.security_policy)
            .field("security_mode", &self.security_mode)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("max_retry", &self.max_retry)
            .finish()
    }
}

/// Configured defaults shared read-only by every invocation of a probe
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeDefaults {
    pub endpoint: Option<String>,
    pub security_policy: Option<String>,
    pub security_mode: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connect timeout in milliseconds
    pub timeout: Option<u64>,
    pub max_retry: Option<u32>,
    /// First reconnect delay in milliseconds
    pub initial_delay: Option<u64>,
    /// Reconnect delay cap in milliseconds
    pub max_delay: Option<u64>,
    pub application_name: Option<String>,
}

impl fmt::Debug for ProbeDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeDefaults")
            .field("endpoint", &self.endpoint)
            .field("security_policy", &self.security_policy)
            .field("security_mode", &self.security_mode)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("max_retry", &self.max_retry)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("application_name", &self.application_name)
            .finish()
    }
}

/// Fully resolved parameters of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub endpoint: String,
    pub security_policy: String,
    pub security_mode: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub connect_strategy: ConnectStrategy,
    pub application_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardcoded_fallbacks() {
        let resolved = ProbeRequest::new().resolve(&ProbeDefaults::default());
        assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(resolved.security_policy, "None");
        assert_eq!(resolved.security_mode, "None");
        assert_eq!(resolved.credentials, None);
        assert_eq!(resolved.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(resolved.connect_strategy.max_retry, DEFAULT_MAX_RETRY);
    }

    #[test]
    fn test_each_field_falls_back_independently() {
        let defaults = ProbeDefaults {
            endpoint: Some("opc.tcp://plc-1:4840".into()),
            security_policy: Some("Basic256Sha256".into()),
            security_mode: Some("SignAndEncrypt".into()),
            username: Some("operator".into()),
            password: Some("from-config".into()),
            timeout: Some(3000),
            max_retry: Some(4),
            ..ProbeDefaults::default()
        };
        let request = ProbeRequest {
            endpoint: Some("opc.tcp://plc-2:4840".into()),
            security_mode: Some("Sign".into()),
            password: Some("from-message".into()),
            ..ProbeRequest::default()
        };

        let resolved = request.resolve(&defaults);
        assert_eq!(resolved.endpoint, "opc.tcp://plc-2:4840");
        assert_eq!(resolved.security_policy, "Basic256Sha256");
        assert_eq!(resolved.security_mode, "Sign");
        assert_eq!(resolved.credentials, Some(Credentials::new("operator", "from-message")));
        assert_eq!(resolved.timeout, Duration::from_millis(3000));
        assert_eq!(resolved.connect_strategy.max_retry, 4);
        assert_eq!(
            resolved.connect_strategy.attempt_timeout,
            Some(Duration::from_millis(3000))
        );
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let defaults = ProbeDefaults {
            endpoint: Some("opc.tcp://plc-1:4840".into()),
            ..ProbeDefaults::default()
        };
        let request = ProbeRequest::new().endpoint("").credentials("operator", "").timeout_ms(0);

        let resolved = request.resolve(&defaults);
        assert_eq!(resolved.endpoint, "opc.tcp://plc-1:4840");
        assert_eq!(resolved.credentials, None);
        assert_eq!(resolved.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_zero_retry_is_kept() {
        let defaults = ProbeDefaults {
            max_retry: Some(3),
            ..ProbeDefaults::default()
        };
        let resolved = ProbeRequest::new().max_retry(0).resolve(&defaults);
        assert_eq!(resolved.connect_strategy.max_retry, 0);
    }

    #[test]
    fn test_backoff_from_defaults() {
        let defaults = ProbeDefaults {
            initial_delay: Some(250),
            max_delay: Some(2000),
            ..ProbeDefaults::default()
        };
        let strategy = ProbeRequest::new().resolve(&defaults).connect_strategy;
        assert_eq!(strategy.initial_delay, Duration::from_millis(250));
        assert_eq!(strategy.max_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_deserialize_payload() {
        let request: ProbeRequest = serde_json::from_str(
            r#"{"endpoint":"opc.tcp://host:4840","securityPolicy":"None","securityMode":"None","timeout":2000,"maxRetry":2}"#,
        )
        .unwrap();
        assert_eq!(request.endpoint.as_deref(), Some("opc.tcp://host:4840"));
        assert_eq!(request.timeout, Some(2000));
        assert_eq!(request.max_retry, Some(2));
        assert_eq!(request.username, None);
    }

    #[test]
    fn test_debug_hides_password() {
        let request = ProbeRequest::new().credentials("operator", "hunter2");
        assert!(!format!("{:?}", request).contains("hunter2"));
    }
}
