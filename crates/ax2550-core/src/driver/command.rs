//! Command issuance: echo verification, ack/nak confirmation and motion frames

use std::time::Duration;

use super::Ax2550;
use crate::listener::{BufferedFilter, TokenMatcher};
use crate::protocol::{
    motion_frame, AckResult, Ax2550Error, IssueFailure, MotionAxis, ACK_TIMEOUT_MS,
    ECHO_TIMEOUT_MS, TERMINATOR,
};

impl Ax2550 {
    /// Write a command and wait for the controller to echo it back.
    ///
    /// This never escalates on its own: a missing echo or a failed write is
    /// returned as an [`IssueFailure`] and the caller decides what to do.
    pub fn issue_command(&mut self, command: &str) -> Result<(), IssueFailure> {
        if !self.is_synchronized() {
            return Err(IssueFailure::new("must be connected to issue commands"));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(IssueFailure::new("must be connected to issue commands"));
        };

        let echo = session.listener.buffered_filter(TokenMatcher::exactly(
            command.trim_end_matches(TERMINATOR),
        ));
        if let Err(e) = session.write(command) {
            return Err(IssueFailure::new(format!("failed to write command: {}", e)));
        }
        if echo.wait(Duration::from_millis(ECHO_TIMEOUT_MS)).is_none() {
            tracing::debug!(command = ?command, "no echo");
            return Err(IssueFailure::new("failed to receive an echo"));
        }

        Ok(())
    }

    /// Issue a command and require a "+" after its echo
    pub fn issue_confirmed_command(&mut self, command: &str) -> Result<(), Ax2550Error> {
        self.require_synchronized("must be connected to issue commands")?;
        let ack_nak = self.session()?.ack_nak.clone();

        // Stale confirmations from earlier commands must not satisfy this one
        ack_nak.clear();
        self.issue_command(command)?;

        let result = wait_for_ack(&ack_nak);
        tracing::debug!(command = ?command, ?result, "confirmation");
        result.into_result()
    }

    /// Set speed (channel 1) and direction (channel 2).
    ///
    /// Values are sent as byte magnitudes with the sign carried by the
    /// command letter; keep them within -255..=255.
    ///
    /// The controller has no combined command: speed is sent and confirmed
    /// first, then direction. If the direction frame fails the new speed has
    /// already been applied and is not rolled back; the call still reports
    /// the failure.
    pub fn move_motors(&mut self, speed: f64, direction: f64) -> Result<(), Ax2550Error> {
        self.require_synchronized("must be connected to move")?;

        self.issue_confirmed_command(&motion_frame(MotionAxis::Speed, speed))?;
        self.issue_confirmed_command(&motion_frame(MotionAxis::Direction, direction))
    }
}

fn wait_for_ack(ack_nak: &BufferedFilter) -> AckResult {
    AckResult::from_token(ack_nak.wait(Duration::from_millis(ACK_TIMEOUT_MS)).as_deref())
}
