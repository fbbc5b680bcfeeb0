//! Serial Protocol Communication
//!
//! Implements the AX2550 serial command protocol: fixed line settings,
//! command frames, echo/ack conventions and encoder response decoding.

pub mod commands;
mod error;
pub mod serial;
pub mod stream;

pub use commands::{
    decode_encoder, motion_frame, AckResult, EncoderChannel, EncoderMode, EncoderReadings,
    MotionAxis,
};
pub use error::{Ax2550Error, IssueFailure};
pub use serial::{configure_port, open_port};
pub use stream::{SerialChannel, Transport};

/// Baud rate used by the controller in serial mode
pub const BAUD_RATE: u32 = 9600;

/// Per-read timeout on the serial line in milliseconds
pub const READ_TIMEOUT_MS: u64 = 250;

/// Bytes that reset the controller
pub const RESET_SEQUENCE: &str = "%rrrrrr\r";

/// Probe written while waiting for serial mode
pub const SERIAL_MODE_PROBE: &str = "\r";

/// Token the controller sends once in serial mode
pub const SERIAL_MODE_OK: &str = "OK";

/// Prefix of the R/C message emitted after a reset
pub const RC_MESSAGE_PREFIX: &str = ":";

/// Unsolicited watchdog token
pub const WATCHDOG_TOKEN: &str = "W";

pub const ACK: &str = "+";
pub const NAK: &str = "-";

/// Command terminator
pub const TERMINATOR: char = '\r';

/// Wait for the R/C message after reset
pub const RESET_ACK_TIMEOUT_MS: u64 = 1000;

/// Wait for each "OK" after a serial-mode probe
pub const PROBE_TIMEOUT_MS: u64 = 25;

/// Number of serial-mode probes before giving up
pub const MAX_PROBE_ATTEMPTS: usize = 10;

/// Wait for a command echo
pub const ECHO_TIMEOUT_MS: u64 = 50;

/// Wait for an ack/nak after an echo
pub const ACK_TIMEOUT_MS: u64 = 100;

/// Wait for an encoder response after the query echo
pub const ENCODER_TIMEOUT_MS: u64 = 100;
