//! Finite state machine for the lifecycle of a single console operation.
//!
//! Every operation walks `Idle → Connecting → Executing → Closing → Done`.
//! A failure at any point moves to `Closing` and ends in `Failed`; the
//! `Closing` step is never skipped.

use std::fmt;

use tracing::{trace, warn};

use super::actions::Operation;

/// Lifecycle phase of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Executing,
    Closing,
    Done,
    Failed,
}

impl SessionPhase {
    /// Terminal phases accept no further events
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Done | SessionPhase::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Connecting => write!(f, "Connecting"),
            SessionPhase::Executing => write!(f, "Executing"),
            SessionPhase::Closing => write!(f, "Closing"),
            SessionPhase::Done => write!(f, "Done"),
            SessionPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events that drive the operation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Connection attempt started
    Connect,
    /// Connection established
    Connected,
    /// The remote command completed
    Completed,
    /// Connecting or executing failed
    Failed,
    /// The connection has been released (or there was none to release)
    Released,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Connect => write!(f, "Connect"),
            SessionEvent::Connected => write!(f, "Connected"),
            SessionEvent::Completed => write!(f, "Completed"),
            SessionEvent::Failed => write!(f, "Failed"),
            SessionEvent::Released => write!(f, "Released"),
        }
    }
}

/// Compute the next phase, or `None` if the event is not valid here.
///
/// `failed` records whether a failure was observed earlier; it only matters
/// when leaving `Closing`.
pub fn next_phase(current: SessionPhase, event: SessionEvent, failed: bool) -> Option<SessionPhase> {
    use SessionEvent as E;
    use SessionPhase as P;

    match (current, event) {
        (P::Idle, E::Connect) => Some(P::Connecting),
        (P::Connecting, E::Connected) => Some(P::Executing),
        (P::Connecting, E::Failed) => Some(P::Closing),
        (P::Executing, E::Completed) => Some(P::Closing),
        (P::Executing, E::Failed) => Some(P::Closing),
        (P::Closing, E::Released) if failed => Some(P::Failed),
        (P::Closing, E::Released) => Some(P::Done),
        _ => None,
    }
}

/// Tracks the phase of one running operation and logs its transitions
#[derive(Debug)]
pub struct PhaseTracker {
    operation: Operation,
    phase: SessionPhase,
    failed: bool,
}

impl PhaseTracker {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            phase: SessionPhase::Idle,
            failed: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Apply an event. Invalid events are logged and leave the phase unchanged.
    pub fn advance(&mut self, event: SessionEvent) -> SessionPhase {
        if event == SessionEvent::Failed {
            self.failed = true;
        }
        match next_phase(self.phase, event, self.failed) {
            Some(next) => {
                trace!(
                    operation = %self.operation,
                    from = %self.phase,
                    to = %next,
                    event = %event,
                    "Session phase transition"
                );
                self.phase = next;
            }
            None => {
                warn!(
                    operation = %self.operation,
                    phase = %self.phase,
                    event = %event,
                    "Ignoring invalid session phase transition"
                );
            }
        }
        self.phase
    }
}
