//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the motor controller
#[derive(Error, Debug)]
pub enum Ax2550Error {
    /// Connection lifecycle misuse (already connected, empty port name)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The reset/serial-mode handshake did not complete
    #[error("Synchronization error: {0}")]
    Synchronization(String),

    /// A command or query failed (not synchronized, no echo, nak, ...)
    #[error("Command failed: {0}")]
    Command(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Ax2550Error {
    /// Human-readable reason without the kind prefix
    pub fn reason(&self) -> String {
        match self {
            Ax2550Error::Connection(r)
            | Ax2550Error::Synchronization(r)
            | Ax2550Error::Command(r)
            | Ax2550Error::Serial(r) => r.clone(),
            Ax2550Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serialport::Error> for Ax2550Error {
    fn from(e: serialport::Error) -> Self {
        Ax2550Error::Serial(e.to_string())
    }
}

/// Failure reported by the low-level command path.
///
/// Issuing a command never raises on its own; callers decide whether the
/// failure escalates into an [`Ax2550Error::Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFailure {
    reason: String,
}

impl IssueFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for IssueFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl From<IssueFailure> for Ax2550Error {
    fn from(failure: IssueFailure) -> Self {
        Ax2550Error::Command(failure.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_failure_escalates_to_command_error() {
        let err: Ax2550Error = IssueFailure::new("failed to receive an echo").into();
        assert!(matches!(err, Ax2550Error::Command(ref r) if r == "failed to receive an echo"));
        assert_eq!(err.reason(), "failed to receive an echo");
    }

    #[test]
    fn test_error_display_keeps_reason() {
        let err = Ax2550Error::Synchronization("failed to enter serial mode".into());
        assert!(err.to_string().contains("failed to enter serial mode"));
    }
}
