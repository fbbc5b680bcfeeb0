//! Encoder counter queries

use std::time::Duration;

use super::Ax2550;
use crate::protocol::{
    decode_encoder, Ax2550Error, EncoderChannel, EncoderMode, EncoderReadings,
    ENCODER_TIMEOUT_MS, TERMINATOR,
};

impl Ax2550 {
    /// Read both encoders, absolute or relative.
    ///
    /// Returns `(encoder1, encoder2)`. Either both reads succeed or the
    /// call fails on the first error.
    pub fn query_encoders(&mut self, relative: bool) -> Result<(i32, i32), Ax2550Error> {
        self.read_encoders(EncoderMode::from(relative))
            .map(Into::into)
    }

    pub fn read_encoders(&mut self, mode: EncoderMode) -> Result<EncoderReadings, Ax2550Error> {
        self.require_synchronized("must be connected to query encoders")?;

        let encoder1 = self.query_encoder(EncoderChannel::First, mode)?;
        let encoder2 = self.query_encoder(EncoderChannel::Second, mode)?;
        Ok(EncoderReadings { encoder1, encoder2 })
    }

    /// Read one encoder counter
    pub fn query_encoder(
        &mut self,
        channel: EncoderChannel,
        mode: EncoderMode,
    ) -> Result<i32, Ax2550Error> {
        self.require_synchronized("must be connected to query encoders")?;
        let encoders = self.session()?.encoders.clone();

        // Replies left over from a query that timed out would be taken as ours
        let orphaned = encoders.count();
        if orphaned > 0 {
            tracing::warn!(orphaned, "discarding orphaned encoder messages");
            self.warn(&format!("{} orphaned encoder messages", orphaned));
        }
        encoders.clear();

        let query = channel.query(mode);
        self.issue_command(query)?;

        let response = encoders
            .wait(Duration::from_millis(ENCODER_TIMEOUT_MS))
            .ok_or_else(|| {
                Ax2550Error::Command(format!(
                    "failed to receive a response from {}",
                    query.trim_end_matches(TERMINATOR)
                ))
            })?;
        tracing::debug!(query = ?query, response = %response, "encoder response");

        decode_encoder(&response)
    }
}
