//! # Slider Box
//!
//! Reads the values streamed by an Arduino-driven slider box over a serial
//! port.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! The box sends one line per sample, e.g. `"512 0 1023 77 300\r\n"`. This
//! library provides:
//! - Serial port auto-detection and raw 115200 8-N-1 configuration
//! - A background polling thread that reassembles and parses lines
//! - Lock-protected access to the latest values with stale-data detection
//!
//! ## Example
//!
//! ```rust,no_run
//! use slider_box::SerialReader;
//!
//! let reader = SerialReader::open("auto", 5)?;
//! let mut values = Vec::new();
//! let missed = reader.fill(&mut values);
//! if missed > 10 {
//!     eprintln!("No data from {} for {} polls", reader.port_name(), missed);
//! }
//! println!("{:?}", values);
//! # Ok::<(), slider_box::ReaderError>(())
//! ```

pub mod device;
pub mod line;
pub mod parse;
pub mod reader;
pub mod snapshot;
pub mod worker;

pub use device::{ReaderConfig, ReaderError};
pub use reader::{ReaderStats, SerialReader};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::device::{list_ports, PortInfo, PortSpec, ReaderConfig, ReaderError};
    pub use crate::reader::{ReaderStats, SerialReader};
    pub use crate::worker::WorkerPriority;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
