//! Lifecycle state machine of a single probe invocation
//!
//! ```text
//! Validating -> Connecting -> CreatingSession -> Reading -> Succeeded
//!      |             |               |              |
//!      +-------------+---------------+--------------+------> Failed
//! ```
//!
//! Teardown is not a state: it runs after the machine has reached a terminal
//! state, on every path.

use opcua_probe_core::{UaError, UaResult};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeState {
    /// Resolving parameters and checking the security pair
    #[default]
    Validating,
    /// Client constructed, connect in flight
    Connecting,
    /// Connected, session creation in flight
    CreatingSession,
    /// Session active, verification read in flight
    Reading,
    /// Verification read returned a usable value
    Succeeded,
    /// Any phase failed
    Failed,
}

impl ProbeState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// The state that follows this one when the current phase succeeds
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Validating => Some(Self::Connecting),
            Self::Connecting => Some(Self::CreatingSession),
            Self::CreatingSession => Some(Self::Reading),
            Self::Reading => Some(Self::Succeeded),
            Self::Succeeded | Self::Failed => None,
        }
    }

    /// Move to `to`, which must be the next state or `Failed`
    ///
    /// # Errors
    /// Returns `UaError::Internal` on any other transition
    pub fn advance(&mut self, to: ProbeState) -> UaResult<()> {
        let allowed = match to {
            Self::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        };
        if !allowed {
            return Err(UaError::Internal(format!("illegal probe transition {} -> {}", self, to)));
        }
        *self = to;
        Ok(())
    }

    /// Mark the invocation failed, keeping the state a failure happened in
    ///
    /// Returns the state that was active when the failure occurred.
    pub fn fail(&mut self) -> ProbeState {
        let at = *self;
        if !self.is_terminal() {
            *self = Self::Failed;
        }
        at
    }
}

impl Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Connecting => "connecting",
            Self::CreatingSession => "creating session",
            Self::Reading => "reading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = ProbeState::default();
        for to in [
            ProbeState::Connecting,
            ProbeState::CreatingSession,
            ProbeState::Reading,
            ProbeState::Succeeded,
        ] {
            state.advance(to).unwrap();
        }
        assert!(state.is_terminal());
        assert_eq!(state.next(), None);
    }

    #[test]
    fn test_cannot_skip_phases() {
        let mut state = ProbeState::Connecting;
        assert!(state.advance(ProbeState::Reading).is_err());
        assert_eq!(state, ProbeState::Connecting);
    }

    #[test]
    fn test_fail_from_any_active_state() {
        let mut state = ProbeState::CreatingSession;
        assert_eq!(state.fail(), ProbeState::CreatingSession);
        assert_eq!(state, ProbeState::Failed);
        assert!(state.advance(ProbeState::Failed).is_err());
    }

    #[test]
    fn test_terminal_success_is_not_overwritten() {
        let mut state = ProbeState::Succeeded;
        state.fail();
        assert_eq!(state, ProbeState::Succeeded);
    }
}
