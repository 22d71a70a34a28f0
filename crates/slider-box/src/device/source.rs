//! Byte sources polled by the reader

use serialport::SerialPort;
use std::io::{self, ErrorKind, Read};

/// Non-blocking byte input feeding the polling loop
pub trait ByteSource: Send {
    /// Read whatever bytes are available right now, up to `buf.len()`.
    ///
    /// Returns `Ok(0)` when nothing is pending; never waits for data.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A zero-timeout serial read reports an empty input queue as a timeout
fn is_no_data(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

impl ByteSource for Box<dyn SerialPort> {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_no_data(&e) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
