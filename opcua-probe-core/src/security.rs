//! Security policy and message security mode for OPC UA sessions
//!
//! Both values arrive as string keys (e.g. `"Basic256Sha256"`, `"SignAndEncrypt"`)
//! and must resolve against the known sets before any connection is attempted.

use crate::error::{UaError, UaResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const POLICY_URI_PREFIX: &str = "http://opcfoundation.org/UA/SecurityPolicy#";

/// Security policy (cryptographic suite)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityPolicy {
    /// No signing and no encryption
    None,
    Basic128,
    Basic192,
    Basic192Rsa15,
    Basic256Rsa15,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
    PubSubAes128Ctr,
    PubSubAes256Ctr,
    /// Deprecated, still offered by older servers
    Basic128Rsa15,
    /// Deprecated, still offered by older servers
    Basic256,
}

impl SecurityPolicy {
    pub const ALL: [SecurityPolicy; 12] = [
        SecurityPolicy::None,
        SecurityPolicy::Basic128,
        SecurityPolicy::Basic192,
        SecurityPolicy::Basic192Rsa15,
        SecurityPolicy::Basic256Rsa15,
        SecurityPolicy::Basic256Sha256,
        SecurityPolicy::Aes128Sha256RsaOaep,
        SecurityPolicy::Aes256Sha256RsaPss,
        SecurityPolicy::PubSubAes128Ctr,
        SecurityPolicy::PubSubAes256Ctr,
        SecurityPolicy::Basic128Rsa15,
        SecurityPolicy::Basic256,
    ];

    /// Get the configuration key of the policy
    pub fn key(&self) -> &'static str {
        match self {
            SecurityPolicy::None => "None",
            SecurityPolicy::Basic128 => "Basic128",
            SecurityPolicy::Basic192 => "Basic192",
            SecurityPolicy::Basic192Rsa15 => "Basic192Rsa15",
            SecurityPolicy::Basic256Rsa15 => "Basic256Rsa15",
            SecurityPolicy::Basic256Sha256 => "Basic256Sha256",
            SecurityPolicy::Aes128Sha256RsaOaep => "Aes128_Sha256_RsaOaep",
            SecurityPolicy::Aes256Sha256RsaPss => "Aes256_Sha256_RsaPss",
            SecurityPolicy::PubSubAes128Ctr => "PubSub_Aes128_CTR",
            SecurityPolicy::PubSubAes256Ctr => "PubSub_Aes256_CTR",
            SecurityPolicy::Basic128Rsa15 => "Basic128Rsa15",
            SecurityPolicy::Basic256 => "Basic256",
        }
    }

    /// Resolve a policy from its configuration key
    ///
    /// Keys are matched exactly; `"none"` is not `"None"`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|policy| policy.key() == key)
    }

    /// Get the policy URI advertised in endpoint descriptions
    pub fn uri(&self) -> String {
        format!("{}{}", POLICY_URI_PREFIX, self.key())
    }

    /// Resolve a policy from its URI
    pub fn from_uri(uri: &str) -> Option<Self> {
        uri.strip_prefix(POLICY_URI_PREFIX).and_then(Self::from_key)
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Message security mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    /// Messages are neither signed nor encrypted
    None = 1,
    /// Messages are signed
    Sign = 2,
    /// Messages are signed and encrypted
    SignAndEncrypt = 3,
}

impl MessageSecurityMode {
    /// Get the mode ID as encoded on the wire
    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// Get the configuration key of the mode
    pub fn key(&self) -> &'static str {
        match self {
            MessageSecurityMode::None => "None",
            MessageSecurityMode::Sign => "Sign",
            MessageSecurityMode::SignAndEncrypt => "SignAndEncrypt",
        }
    }

    /// Resolve a mode from its configuration key
    ///
    /// `"Invalid"` (wire value 0) is deliberately not resolvable.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "None" => Some(MessageSecurityMode::None),
            "Sign" => Some(MessageSecurityMode::Sign),
            "SignAndEncrypt" => Some(MessageSecurityMode::SignAndEncrypt),
            _ => None,
        }
    }
}

impl fmt::Display for MessageSecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved policy/mode pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub policy: SecurityPolicy,
    pub mode: MessageSecurityMode,
}

impl SecurityConfig {
    pub fn new(policy: SecurityPolicy, mode: MessageSecurityMode) -> Self {
        Self { policy, mode }
    }

    /// Resolve both keys, failing if either one is unknown
    ///
    /// # Errors
    /// Returns `UaError::InvalidSecurity` carrying both raw keys
    pub fn resolve(policy: &str, mode: &str) -> UaResult<Self> {
        match (SecurityPolicy::from_key(policy), MessageSecurityMode::from_key(mode)) {
            (Some(policy), Some(mode)) => Ok(Self { policy, mode }),
            _ => Err(UaError::InvalidSecurity {
                policy: policy.to_string(),
                mode: mode.to_string(),
            }),
        }
    }

    /// True only when both the policy and the mode are `None`
    pub fn is_unsecured(&self) -> bool {
        self.policy == SecurityPolicy::None && self.mode == MessageSecurityMode::None
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::new(SecurityPolicy::None, MessageSecurityMode::None)
    }
}
