//! Serial device access
//!
//! Opening, auto-detecting and configuring the slider box's serial port.
//!
//! The box streams ASCII lines terminated by `\r\n`, each carrying one
//! integer per slider separated by spaces.

pub mod config;
mod error;
pub mod port;
pub mod source;

pub use config::{ReaderConfig, SerialConfig};
pub use error::ReaderError;
pub use port::{list_ports, open_device, PortInfo, PortSpec, AUTO_DETECT_CANDIDATES};
pub use source::ByteSource;

/// Port string requesting auto-detection
pub const AUTO_PORT: &str = "auto";

/// Baud rate the slider box firmware transmits at
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Values per line on the standard five-slider box
pub const DEFAULT_VALUE_COUNT: usize = 5;

/// Maximum bytes fetched by a single non-blocking read
pub const READ_CHUNK_SIZE: usize = 128;

/// Capacity of the line-assembly buffer
pub const LINE_BUFFER_SIZE: usize = 128;

/// Sleep between reads when the device had nothing to deliver
pub const DEFAULT_IDLE_INTERVAL_US: u64 = 100;
