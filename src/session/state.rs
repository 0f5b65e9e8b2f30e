use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;

/// Authoritative lifecycle state of a transcription session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Connected, no timer armed and no batch running
    Open,
    /// Timer armed or batch in flight
    Batching,
    /// Finalize requested, draining in progress
    Finalizing,
    /// Terminal
    Closed,
}

/// Inputs that drive [`SessionState`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    FragmentArrived,
    /// A non-final batch finished; `pending` is whether fragments arrived meanwhile
    BatchCompleted { pending: bool },
    FinalizeRequested,
    FinalCompleted,
    TransportClosed,
}

impl SessionState {
    /// Compute the next state, rejecting transitions the lifecycle forbids
    pub fn transition(self, event: StateEvent) -> Result<SessionState, SessionError> {
        use SessionState::*;
        use StateEvent::*;

        let next = match (self, event) {
            (_, TransportClosed) => Closed,
            (Open | Batching, FragmentArrived) => Batching,
            (Batching, BatchCompleted { pending: true }) => Batching,
            (Batching, BatchCompleted { pending: false }) => Open,
            (Open | Batching, FinalizeRequested) => Finalizing,
            // in-flight batch draining before the final one
            (Finalizing, BatchCompleted { .. }) => Finalizing,
            (Finalizing, FinalCompleted) => Closed,
            (from, event) => {
                return Err(SessionError::InvalidTransition {
                    from: from.to_string(),
                    event: format!("{:?}", event),
                })
            }
        };

        Ok(next)
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }

    /// Whether new audio fragments may still be buffered
    pub fn accepts_fragments(self) -> bool {
        matches!(self, SessionState::Open | SessionState::Batching)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Open => "open",
            SessionState::Batching => "batching",
            SessionState::Finalizing => "finalizing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
