//! Protocol commands
//!
//! Builds the text frames sent to the controller and decodes the
//! replies that carry data.

use serde::{Deserialize, Serialize};

use super::{Ax2550Error, ACK, NAK};

/// Motion channel addressed by a `!A`/`!B` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAxis {
    /// Channel 1 ('A')
    Speed,
    /// Channel 2 ('B')
    Direction,
}

impl MotionAxis {
    /// Command letter for a non-negative value; negative values use lowercase
    pub fn letter(&self) -> char {
        match self {
            MotionAxis::Speed => 'A',
            MotionAxis::Direction => 'B',
        }
    }
}

/// Build a motion frame: `"!" + letter + HH + "\r"`.
///
/// The magnitude is `|value|` truncated toward zero and wrapped to a byte,
/// so callers must keep values within -255..=255. Negative values select the
/// lowercase letter.
pub fn motion_frame(axis: MotionAxis, value: f64) -> String {
    let magnitude = if value.is_nan() {
        0u8
    } else {
        // f64 -> u32 saturates, u32 -> u8 wraps
        value.abs().trunc() as u32 as u8
    };
    let letter = if value < 0.0 {
        axis.letter().to_ascii_lowercase()
    } else {
        axis.letter()
    };

    format!("!{}{:02X}\r", letter, magnitude)
}

/// Which encoder counter is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderMode {
    /// Absolute count since power-on or last reset
    Absolute,
    /// Count since the previous relative read
    Relative,
}

impl From<bool> for EncoderMode {
    fn from(relative: bool) -> Self {
        if relative {
            EncoderMode::Relative
        } else {
            EncoderMode::Absolute
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderChannel {
    First,
    Second,
}

impl EncoderChannel {
    /// Query string for this channel in the given mode
    pub fn query(&self, mode: EncoderMode) -> &'static str {
        match (mode, self) {
            (EncoderMode::Absolute, EncoderChannel::First) => "?q0\r",
            (EncoderMode::Absolute, EncoderChannel::Second) => "?q1\r",
            (EncoderMode::Relative, EncoderChannel::First) => "?q4\r",
            (EncoderMode::Relative, EncoderChannel::Second) => "?q5\r",
        }
    }
}

/// A pair of encoder counts, in (encoder1, encoder2) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderReadings {
    pub encoder1: i32,
    pub encoder2: i32,
}

impl From<EncoderReadings> for (i32, i32) {
    fn from(r: EncoderReadings) -> Self {
        (r.encoder1, r.encoder2)
    }
}

/// Outcome of waiting for a one-character confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckResult {
    Ack,
    Nak,
    Timeout,
}

impl AckResult {
    /// Classify the token (if any) received in the ack window.
    ///
    /// Anything other than an exact "+" or "-" counts as no confirmation.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(ACK) => AckResult::Ack,
            Some(NAK) => AckResult::Nak,
            _ => AckResult::Timeout,
        }
    }

    pub fn into_result(self) -> Result<(), Ax2550Error> {
        match self {
            AckResult::Ack => Ok(()),
            AckResult::Nak => Err(Ax2550Error::Command(
                "nak received, command failed".to_string(),
            )),
            AckResult::Timeout => Err(Ax2550Error::Command(
                "did not receive an ack or nak".to_string(),
            )),
        }
    }
}

/// Decode an encoder response into a signed 32-bit count.
///
/// The controller drops leading digits, so the response is sign-extended
/// from its first digit: '0'-'7' pads with '0', '8'-'F' pads with 'F'.
pub fn decode_encoder(response: &str) -> Result<i32, Ax2550Error> {
    let response = response.trim();
    let invalid = || Ax2550Error::Command(format!("invalid encoder response: {:?}", response));

    if response.is_empty()
        || response.len() > 8
        || !response.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(invalid());
    }

    let fill = match response.as_bytes()[0] {
        b'0'..=b'7' => '0',
        _ => 'F',
    };
    let mut padded: String = std::iter::repeat(fill).take(8 - response.len()).collect();
    padded.push_str(response);
    let raw = u32::from_str_radix(&padded, 16).map_err(|_| invalid())?;

    Ok(raw as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_motion_frame_sign_selects_case() {
        assert_eq!(motion_frame(MotionAxis::Speed, 127.0), "!A7F\r");
        assert_eq!(motion_frame(MotionAxis::Speed, -127.0), "!a7F\r");
        assert_eq!(motion_frame(MotionAxis::Direction, 0.0), "!B00\r");
        assert_eq!(motion_frame(MotionAxis::Direction, -10.0), "!b0A\r");
    }

    #[test]
    fn test_motion_frame_full_byte_range() {
        for m in 0..=255u32 {
            for sign in [1.0, -1.0] {
                let value = sign * m as f64;
                let frame = motion_frame(MotionAxis::Speed, value);
                assert_eq!(frame.len(), 5);
                assert_eq!(&frame[2..4], format!("{:02X}", m));
                let expected = if value < 0.0 { 'a' } else { 'A' };
                assert_eq!(frame.chars().nth(1), Some(expected));
            }
        }
    }

    #[test]
    fn test_motion_frame_truncates_and_wraps() {
        assert_eq!(motion_frame(MotionAxis::Speed, 12.9), "!A0C\r");
        assert_eq!(motion_frame(MotionAxis::Speed, -0.5), "!a00\r");
        assert_eq!(motion_frame(MotionAxis::Speed, 256.0), "!A00\r");
        assert_eq!(motion_frame(MotionAxis::Speed, f64::NAN), "!A00\r");
    }

    #[test]
    fn test_encoder_queries() {
        assert_eq!(EncoderChannel::First.query(EncoderMode::Absolute), "?q0\r");
        assert_eq!(EncoderChannel::Second.query(EncoderMode::Absolute), "?q1\r");
        assert_eq!(EncoderChannel::First.query(EncoderMode::Relative), "?q4\r");
        assert_eq!(EncoderChannel::Second.query(EncoderMode::Relative), "?q5\r");
        assert_eq!(EncoderMode::from(true), EncoderMode::Relative);
    }

    #[test]
    fn test_decode_positive() {
        assert_eq!(decode_encoder("7F").unwrap(), 127);
        assert_eq!(decode_encoder("00000001").unwrap(), 1);
        assert_eq!(decode_encoder("0").unwrap(), 0);
        assert_eq!(decode_encoder("7FFFFFFF").unwrap(), i32::MAX);
    }

    #[test]
    fn test_decode_sign_extends() {
        assert_eq!(decode_encoder("80").unwrap(), 0xFFFF_FF80u32 as i32);
        assert_eq!(decode_encoder("80").unwrap(), -128);
        assert_eq!(decode_encoder("F").unwrap(), -1);
        assert_eq!(decode_encoder("fffe").unwrap(), -2);
        assert_eq!(decode_encoder("80000000").unwrap(), i32::MIN);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_encoder("").is_err());
        assert!(decode_encoder("123456789").is_err());
        assert!(decode_encoder("12G4").is_err());
    }

    #[test]
    fn test_ack_result() {
        assert_eq!(AckResult::from_token(Some("+")), AckResult::Ack);
        assert_eq!(AckResult::from_token(Some("-")), AckResult::Nak);
        assert_eq!(AckResult::from_token(Some("+-")), AckResult::Timeout);
        assert_eq!(AckResult::from_token(None), AckResult::Timeout);
        assert!(AckResult::Ack.into_result().is_ok());
        assert_eq!(
            AckResult::Nak.into_result().unwrap_err().reason(),
            "nak received, command failed"
        );
    }
}
