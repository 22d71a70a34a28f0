//! Serial and reader configuration
//!
//! [`SerialConfig`] describes the raw transmission parameters handed to the
//! platform layer. [`ReaderConfig`] is the user-facing configuration of a
//! whole [`SerialReader`](crate::reader::SerialReader) and can be loaded from
//! a JSON file.

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::{
    ReaderError, AUTO_DETECT_CANDIDATES, AUTO_PORT, DEFAULT_BAUD_RATE, DEFAULT_IDLE_INTERVAL_US,
    DEFAULT_VALUE_COUNT, LINE_BUFFER_SIZE, READ_CHUNK_SIZE,
};
use crate::worker::WorkerPriority;

/// Raw transmission parameters for the serial device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity checking mode
    pub parity: Parity,
    /// Stop bits per character
    pub stop_bits: StopBits,
    /// Hardware or software flow control
    pub flow_control: FlowControl,
    /// How long a read may wait for data. Zero makes every read return
    /// immediately with whatever bytes are available, possibly none.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::raw(DEFAULT_BAUD_RATE)
    }
}

impl SerialConfig {
    /// 8-N-1, no flow control, non-blocking reads at the given baud rate
    pub fn raw(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout: Duration::ZERO,
        }
    }

    /// Whether reads return immediately instead of waiting for data
    pub fn is_non_blocking(&self) -> bool {
        self.read_timeout.is_zero()
    }

    /// Build a port builder for `path` carrying these settings
    pub fn builder(&self, path: &str) -> SerialPortBuilder {
        serialport::new(path, self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
            .timeout(self.read_timeout)
    }
}

/// Configuration of a serial reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Device path, or "" / "auto" to auto-detect
    pub port: String,

    /// Paths tried in order when auto-detecting
    pub candidates: Vec<String>,

    /// Number of integers expected per line
    pub value_count: usize,

    /// Baud rate
    pub baud_rate: u32,

    /// Maximum bytes fetched by a single read
    pub chunk_size: usize,

    /// Longest line (without terminator) that is still parsed
    pub max_line_len: usize,

    /// Sleep between reads when no bytes are available, in microseconds
    pub idle_interval_us: u64,

    /// Scheduling priority requested for the polling thread
    pub priority: WorkerPriority,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            candidates: AUTO_DETECT_CANDIDATES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            value_count: DEFAULT_VALUE_COUNT,
            baud_rate: DEFAULT_BAUD_RATE,
            chunk_size: READ_CHUNK_SIZE,
            max_line_len: LINE_BUFFER_SIZE,
            idle_interval_us: DEFAULT_IDLE_INTERVAL_US,
            priority: WorkerPriority::RealTime,
        }
    }
}

impl ReaderConfig {
    /// Default configuration for the given port and value count
    pub fn new(port: impl Into<String>, value_count: usize) -> Self {
        Self {
            port: port.into(),
            value_count,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ReaderError> {
        let config: ReaderConfig =
            serde_json::from_str(json).map_err(|e| ReaderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ReaderError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Check that the sizes are usable
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.value_count == 0 {
            return Err(ReaderError::InvalidConfig(
                "value_count must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ReaderError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_line_len == 0 {
            return Err(ReaderError::InvalidConfig(
                "max_line_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Serial settings derived from this configuration
    pub fn serial(&self) -> SerialConfig {
        SerialConfig::raw(self.baud_rate)
    }

    /// Idle sleep as a duration
    pub fn idle_interval(&self) -> Duration {
        Duration::from_micros(self.idle_interval_us)
    }
}
