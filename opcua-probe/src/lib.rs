//! opcua-probe - connection-and-session probe for OPC UA servers
//!
//! Verifies that an OPC UA endpoint is reachable and that a session can be
//! established under a given security policy, security mode and (optionally)
//! user-name credentials, by performing one read of the server's current time.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `opcua-probe-core`: errors, security enums, node ids, values, endpoint URLs
//! - `opcua-probe-transport`: protocol stack traits, connect strategy, scripted stack
//! - `opcua-probe-client`: the probe lifecycle, requests, results and notifications
//!
//! # Usage
//!
//! ```no_run
//! use opcua_probe::prelude::*;
//!
//! # async fn demo() {
//! let probe = ConnectionProbe::new(ScriptedStack::new(Script::reachable())).with_name("line-3");
//! let request = ProbeRequest::new()
//!     .endpoint("opc.tcp://plc-7:4840")
//!     .security("Basic256Sha256", "SignAndEncrypt")
//!     .credentials("operator", "secret");
//!
//! let result = probe.run(&request, &LogObserver::default()).await;
//! assert_eq!(result.status, ProbeStatus::Connected);
//! # }
//! ```

// Re-export core types
pub use opcua_probe_core::{UaError, UaResult};

pub mod types {
    pub use opcua_probe_core::*;
}

pub mod transport {
    pub use opcua_probe_transport::*;
}

pub mod client {
    pub use opcua_probe_client::*;
}

pub use opcua_probe_client::{ConnectionProbe, ProbeDefaults, ProbeRequest, ProbeResult, ProbeStatus};

/// Everything needed to run a probe
pub mod prelude {
    pub use opcua_probe_client::{
        CallbackObserver, ConnectionProbe, CredentialDisclosure, LogObserver, NoopObserver,
        PhaseNotification, PhaseObserver, ProbeDefaults, ProbePhase, ProbeRequest, ProbeResult,
        ProbeStatus, phase_channel,
    };
    pub use opcua_probe_core::{UaError, UaResult, Variant};
    pub use opcua_probe_transport::{ClientFactory, ClientOptions, Script, ScriptedStack, UaClient, UaSession};
}
