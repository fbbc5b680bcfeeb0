//! # AX2550 Core Library
//!
//! Session and protocol driver for the Roboteq AX2550 motor controller.

#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial line setup with the controller's fixed settings (9600 7E1)
//! - A background listener that turns the byte stream into tokens
//! - Reset/serial-mode synchronization
//! - Motion commands with echo and ack/nak confirmation
//! - Encoder queries with sign extension
//! - Watchdog notifications
//!
//! ## Example
//!
//! ```rust,ignore
//! use ax2550_core::{Ax2550, DriverConfig};
//!
//! let mut driver = Ax2550::new(DriverConfig::new("/dev/ttyUSB0"));
//! driver.set_watchdog_callback(|| eprintln!("watchdog fired"));
//! driver.connect(None)?;
//!
//! driver.move_motors(64.0, -10.0)?;
//! let (left, right) = driver.query_encoders(false)?;
//! println!("encoders: {left} {right}");
//! ```

pub mod config;
pub mod driver;
pub mod listener;
pub mod protocol;

pub use config::DriverConfig;
pub use driver::{Ax2550, ConnectionState};
pub use protocol::Ax2550Error;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::DriverConfig;
    pub use crate::driver::{Ax2550, ConnectionState, WatchdogCallback};
    pub use crate::listener::{BufferedFilter, SerialListener, TokenMatcher};
    pub use crate::protocol::{
        AckResult, Ax2550Error, EncoderChannel, EncoderMode, EncoderReadings, IssueFailure,
        Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
