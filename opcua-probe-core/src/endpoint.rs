//! OPC UA endpoint URLs (`opc.tcp://host[:port][/path]`)

use crate::error::{UaError, UaResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Default port for `opc.tcp` endpoints
pub const DEFAULT_PORT: u16 = 4840;

static ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^opc\.tcp://(?P<host>\[[0-9A-Fa-f:.]+\]|[^:/\[\]\s]+)(?::(?P<port>\d+))?(?P<path>/\S*)?$")
        .expect("static endpoint pattern")
});

/// Parsed endpoint URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointUrl {
    host: String,
    port: u16,
    path: String,
}

impl EndpointUrl {
    /// Parse an endpoint URL
    ///
    /// # Errors
    /// Returns `UaError::InvalidEndpoint` if the scheme is not `opc.tcp`,
    /// the host is missing, or the port is not a valid `u16`.
    pub fn parse(url: &str) -> UaResult<Self> {
        let caps = ENDPOINT_PATTERN
            .captures(url.trim())
            .ok_or_else(|| UaError::InvalidEndpoint(url.to_string()))?;

        let port = match caps.name("port") {
            Some(port) => port
                .as_str()
                .parse::<u16>()
                .map_err(|_| UaError::InvalidEndpoint(format!("port out of range in {}", url)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: caps["host"].to_string(),
            port,
            path: caps.name("path").map(|p| p.as_str().to_string()).unwrap_or_default(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `host:port`, suitable for a socket connect
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "opc.tcp://{}:{}{}", self.host, self.port, self.path)
    }
}
