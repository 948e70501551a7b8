//! Relay client error types

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Stage of a request at which the transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportPhase {
    Resolve,
    Connect,
    Send,
    Receive,
}

impl fmt::Display for TransportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            TransportPhase::Resolve => "resolve",
            TransportPhase::Connect => "connect to",
            TransportPhase::Send => "send to",
            TransportPhase::Receive => "receive from",
        };
        write!(f, "{}", phase)
    }
}

/// Errors that can occur while talking to a relay board
#[derive(Error, Debug)]
pub enum RelayError {
    /// Connect refused, timeout, reset or unresolvable host
    #[error("Failed to {phase} {addr}: {source}")]
    Transport {
        phase: TransportPhase,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The device answered with bytes that could not be decoded at all
    #[error("Malformed response from {addr}: {reason}")]
    MalformedResponse { addr: String, reason: String },

    /// Argument rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RelayError {
    pub(crate) fn transport(
        phase: TransportPhase,
        addr: impl Into<String>,
        source: io::Error,
    ) -> Self {
        RelayError::Transport {
            phase,
            addr: addr.into(),
            source,
        }
    }

    /// True if the request ran out of its time budget.
    ///
    /// Read timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
    pub fn is_timeout(&self) -> bool {
        match self {
            RelayError::Transport { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RelayError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = RelayError::transport(
            TransportPhase::Connect,
            "10.0.0.5:6722",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(err.to_string(), "Failed to connect to 10.0.0.5:6722: refused");
        assert!(err.is_transport());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_kinds() {
        for kind in [io::ErrorKind::TimedOut, io::ErrorKind::WouldBlock] {
            let err = RelayError::transport(TransportPhase::Receive, "h:1", io::Error::from(kind));
            assert!(err.is_timeout());
        }
        assert!(!RelayError::InvalidInput("channel 9".into()).is_timeout());
    }
}
