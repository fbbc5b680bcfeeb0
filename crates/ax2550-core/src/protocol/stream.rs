use serialport::SerialPort;
use std::io::{self, Read, Write};

/// Byte-stream link to the controller.
///
/// The driver writes through one handle while the listener thread reads
/// from a clone obtained with [`Transport::try_clone_box`]. Reads are
/// expected to time out (`TimedOut`/`WouldBlock`) rather than block forever,
/// so the reader can notice a stop request.
pub trait Transport: Read + Write + Send {
    /// Clone the handle so reads and writes can happen on different threads
    fn try_clone_box(&self) -> io::Result<Box<dyn Transport>>;
}

/// Serial port wrapper implementing Transport
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialChannel {
    fn try_clone_box(&self) -> io::Result<Box<dyn Transport>> {
        let port_clone = self
            .port
            .try_clone()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Box::new(SerialChannel::new(port_clone)))
    }
}
