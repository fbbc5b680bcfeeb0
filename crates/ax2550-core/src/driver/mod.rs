//! Connection management
//!
//! Handles the connection lifecycle and the reset/serial-mode handshake.
//! Commands, encoder queries and the watchdog live in the submodules and
//! all go through the session opened here.

mod command;
mod encoder;
mod watchdog;

pub use watchdog::WatchdogCallback;

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DriverConfig;
use crate::listener::{BufferedFilter, CallbackFilter, SerialListener, TokenMatcher};
use crate::protocol::{
    open_port, Ax2550Error, Transport, MAX_PROBE_ATTEMPTS, PROBE_TIMEOUT_MS,
    RC_MESSAGE_PREFIX, RESET_ACK_TIMEOUT_MS, RESET_SEQUENCE, SERIAL_MODE_OK, SERIAL_MODE_PROBE,
};
use watchdog::WatchdogMonitor;

/// Opens the transport for a port name
pub type TransportFactory = dyn Fn(&str) -> Result<Box<dyn Transport>, Ax2550Error> + Send + Sync;

/// Receives informational or warning messages
pub type LogHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No transport open
    Disconnected,
    /// Transport open, handshake not finished
    Connected,
    /// Controller is in serial mode and accepts commands
    Synchronized,
}

fn default_info(msg: &str) {
    println!("AX2550 Info: {}", msg);
}

fn default_warn(msg: &str) {
    eprintln!("AX2550 Warning: {}", msg);
}

/// Everything owned by one open connection. Dropping it stops the listener
/// and releases the transport.
struct Session {
    transport: Box<dyn Transport>,
    listener: SerialListener,
    encoders: BufferedFilter,
    ack_nak: BufferedFilter,
    rc_message: BufferedFilter,
    _watchdog: CallbackFilter,
}

impl Session {
    fn write(&mut self, text: &str) -> std::io::Result<()> {
        tracing::debug!(frame = ?text, "write");
        self.transport.write_all(text.as_bytes())?;
        self.transport.flush()
    }
}

/// Driver for one AX2550 motor controller.
///
/// Protocol-issuing calls take `&mut self`: the controller can only
/// correlate one command at a time, and concurrent callers would consume
/// each other's acks and encoder replies.
pub struct Ax2550 {
    config: DriverConfig,
    state: ConnectionState,
    session: Option<Session>,
    factory: Box<TransportFactory>,
    info: LogHandler,
    warn: LogHandler,
    watchdog: WatchdogMonitor,
}

impl Ax2550 {
    /// Create a driver that opens real serial ports (not yet connected)
    pub fn new(config: DriverConfig) -> Self {
        Self::with_transport_factory(config, open_port)
    }

    /// Create a driver whose transport comes from `factory`
    pub fn with_transport_factory<F>(config: DriverConfig, factory: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn Transport>, Ax2550Error> + Send + Sync + 'static,
    {
        Self {
            config,
            state: ConnectionState::Disconnected,
            session: None,
            factory: Box::new(factory),
            info: Arc::new(default_info),
            warn: Arc::new(default_warn),
            watchdog: WatchdogMonitor::default(),
        }
    }

    /// Create a driver and connect to `port` right away
    pub fn open(port: &str) -> Result<Self, Ax2550Error> {
        let mut driver = Self::new(DriverConfig::new(port));
        driver.connect(None)?;
        Ok(driver)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != ConnectionState::Disconnected
    }

    pub fn is_synchronized(&self) -> bool {
        self.state == ConnectionState::Synchronized
    }

    /// Configured port name
    pub fn port(&self) -> &str {
        &self.config.port_name
    }

    /// Replace the informational message sink
    pub fn set_info_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.info = Arc::new(handler);
    }

    /// Replace the warning message sink
    pub fn set_warn_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warn = Arc::new(handler);
    }

    /// Register the callback run when the controller reports a watchdog timeout.
    ///
    /// The callback runs on the listener thread and may be replaced while connected.
    pub fn set_watchdog_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.watchdog.set(Arc::new(callback));
    }

    pub fn clear_watchdog_callback(&self) {
        self.watchdog.clear();
    }

    fn info(&self, msg: &str) {
        (self.info)(msg);
    }

    fn warn(&self, msg: &str) {
        (self.warn)(msg);
    }

    /// Connect to the controller and synchronize with it.
    ///
    /// `port` overrides the configured port name when given and non-empty.
    pub fn connect(&mut self, port: Option<&str>) -> Result<(), Ax2550Error> {
        if self.state != ConnectionState::Disconnected {
            return Err(Ax2550Error::Connection("already connected".to_string()));
        }
        if let Some(port) = port.filter(|p| !p.is_empty()) {
            self.config.port_name = port.to_string();
        }
        if self.config.port_name.is_empty() {
            return Err(Ax2550Error::Connection(
                "serial port name is empty".to_string(),
            ));
        }

        self.disconnect();

        // Subscriptions go in before the port opens so nothing is missed
        let mut listener = SerialListener::new();
        let encoders = listener.buffered_filter(TokenMatcher::HexLeading);
        let watchdog = self.watchdog.subscribe(&listener);
        let ack_nak = listener.buffered_filter(TokenMatcher::contains_any(&['+', '-']));
        let rc_message = listener.buffered_filter(TokenMatcher::starts_with(RC_MESSAGE_PREFIX));

        tracing::debug!(port = %self.config.port_name, "connecting");
        let transport = (self.factory)(&self.config.port_name)?;
        listener.start(transport.try_clone_box()?)?;

        self.session = Some(Session {
            transport,
            listener,
            encoders,
            ack_nak,
            rc_message,
            _watchdog: watchdog,
        });
        self.state = ConnectionState::Connected;

        if let Err(e) = self.sync() {
            tracing::debug!("handshake failed: {}", e);
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Disconnect from the controller. Safe to call at any time.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        if let Some(mut session) = self.session.take() {
            session.listener.stop();
            tracing::debug!(port = %self.config.port_name, "disconnected");
        }
    }

    /// Reset the controller and probe until it answers in serial mode
    fn sync(&mut self) -> Result<(), Ax2550Error> {
        if self.state == ConnectionState::Synchronized {
            return Ok(());
        }
        let session = self.session_mut()?;

        session.rc_message.clear();
        session.write(RESET_SEQUENCE)?;
        if session
            .rc_message
            .wait(Duration::from_millis(RESET_ACK_TIMEOUT_MS))
            .is_none()
        {
            return Err(Ax2550Error::Synchronization(
                "no R/C message after reset".to_string(),
            ));
        }

        let ok = session
            .listener
            .buffered_filter(TokenMatcher::exactly(SERIAL_MODE_OK));
        let mut attempts = 0;
        let mut in_serial_mode = false;
        while attempts < MAX_PROBE_ATTEMPTS {
            attempts += 1;
            session.write(SERIAL_MODE_PROBE)?;
            if ok.wait(Duration::from_millis(PROBE_TIMEOUT_MS)).is_some() {
                in_serial_mode = true;
                break;
            }
        }
        if !in_serial_mode {
            return Err(Ax2550Error::Synchronization(
                "failed to enter serial mode".to_string(),
            ));
        }

        self.state = ConnectionState::Synchronized;
        tracing::info!(attempts, "synchronized");
        self.info("Synchronized with the ax2550");
        Ok(())
    }

    fn session(&self) -> Result<&Session, Ax2550Error> {
        self.session
            .as_ref()
            .ok_or_else(|| Ax2550Error::Command("not connected".to_string()))
    }

    fn session_mut(&mut self) -> Result<&mut Session, Ax2550Error> {
        self.session
            .as_mut()
            .ok_or_else(|| Ax2550Error::Command("not connected".to_string()))
    }

    fn require_synchronized(&self, reason: &str) -> Result<(), Ax2550Error> {
        if self.state != ConnectionState::Synchronized {
            return Err(Ax2550Error::Command(reason.to_string()));
        }
        Ok(())
    }
}

impl Drop for Ax2550 {
    fn drop(&mut self) {
        self.disconnect();
    }
}
