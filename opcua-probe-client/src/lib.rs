//! OPC UA connection probe
//!
//! A probe invocation connects to an endpoint, opens an anonymous or
//! user-name session, reads `Server_ServerStatus_CurrentTime` and reports one
//! [`ProbeResult`]. Whatever happens, the session and the connection are
//! released exactly once before the result is returned.
//!
//! # Modules
//!
//! - `request`: invocation parameters and configured defaults
//! - `phase`: phase notifications and observers
//! - `state`: the per-invocation lifecycle state machine
//! - `teardown`: scoped ownership of the client and session
//! - `result`: result record
//! - `probe`: [`ConnectionProbe`]

pub mod phase;
pub mod probe;
pub mod request;
pub mod result;
pub mod state;
pub mod teardown;

pub use phase::{
    CallbackObserver, LogObserver, NoopObserver, PhaseNotification, PhaseObserver, ProbePhase,
    phase_channel,
};
pub use probe::{ConnectionProbe, VERIFICATION_NODE};
pub use request::{
    DEFAULT_APPLICATION_NAME, DEFAULT_ENDPOINT, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_MAX_RETRY, DEFAULT_SECURITY_MODE, DEFAULT_SECURITY_POLICY, DEFAULT_TIMEOUT_MS,
    ProbeDefaults, ProbeRequest, ResolvedRequest,
};
pub use result::{CredentialDisclosure, ProbeResult, ProbeStatus};
pub use state::ProbeState;
pub use teardown::{TeardownGuard, TeardownReport};
