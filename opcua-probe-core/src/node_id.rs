use crate::error::{UaError, UaResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static NODE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:ns=(?P<ns>\d+);)?(?P<kind>[isgb])=(?P<id>.+)$").expect("static node id pattern")
});

/// Identifier part of a [`NodeId`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(String),
    Opaque(String),
}

/// Node identifier in the server address space
///
/// String form follows the OPC UA notation `ns=<namespace>;<kind>=<identifier>`,
/// where the namespace part is omitted for namespace 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    /// `Server_ServerStatus_CurrentTime`
    pub const SERVER_STATUS_CURRENT_TIME: NodeId = NodeId::numeric(0, 2258);

    /// `Server_ServerStatus`
    pub const SERVER_STATUS: NodeId = NodeId::numeric(0, 2256);

    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    /// Parse a node id such as `"ns=0;i=2258"` or `"ns=2;s=Temperature"`
    pub fn from_string(s: &str) -> UaResult<Self> {
        let caps = NODE_ID_PATTERN
            .captures(s.trim())
            .ok_or_else(|| UaError::InvalidNodeId(s.to_string()))?;

        let namespace = match caps.name("ns") {
            Some(ns) => ns
                .as_str()
                .parse::<u16>()
                .map_err(|_| UaError::InvalidNodeId(format!("namespace out of range: {}", s)))?,
            None => 0,
        };

        let id = caps["id"].to_string();
        let identifier = match &caps["kind"] {
            "i" => Identifier::Numeric(
                id.parse::<u32>()
                    .map_err(|_| UaError::InvalidNodeId(format!("invalid numeric identifier: {}", s)))?,
            ),
            "s" => Identifier::String(id),
            "g" => Identifier::Guid(id),
            _ => Identifier::Opaque(id),
        };

        Ok(Self { namespace, identifier })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "i={}", v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={}", v),
            Identifier::Opaque(v) => write!(f, "b={}", v),
        }
    }
}

/// Node attribute identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeId {
    NodeId = 1,
    NodeClass = 2,
    BrowseName = 3,
    DisplayName = 4,
    Description = 5,
    Value = 13,
    DataType = 14,
}

impl AttributeId {
    pub fn id(&self) -> u32 {
        *self as u32
    }
}
