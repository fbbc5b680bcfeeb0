//! Serial port handling
//!
//! Opens the controller's serial line with its fixed settings:
//! 9600 baud, 7 data bits, even parity, 1 stop bit.

use serialport::SerialPort;
use std::time::Duration;

use super::{Ax2550Error, SerialChannel, Transport, BAUD_RATE, READ_TIMEOUT_MS};

/// Open a serial port with the controller's line settings
pub fn open_port(name: &str) -> Result<Box<dyn Transport>, Ax2550Error> {
    tracing::debug!(port = name, baud = BAUD_RATE, "opening serial port");

    let mut port = serialport::new(name, BAUD_RATE)
        .timeout(Duration::from_millis(READ_TIMEOUT_MS))
        .open()
        .map_err(|e| Ax2550Error::Serial(format!("{}: {}", name, e)))?;
    configure_port(port.as_mut())?;

    Ok(Box::new(SerialChannel::new(port)))
}

/// Configure a serial port for the controller (7E1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), Ax2550Error> {
    port.set_data_bits(serialport::DataBits::Seven)?;
    port.set_parity(serialport::Parity::Even)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;

    if let Err(e) = port.clear(serialport::ClearBuffer::All) {
        tracing::debug!("configure_port: failed to clear buffers: {} (continuing)", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_is_serial_error() {
        let result = open_port("/dev/ax2550-does-not-exist");
        assert!(matches!(result, Err(Ax2550Error::Serial(_))));
    }
}
