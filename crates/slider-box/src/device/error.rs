//! Reader errors

use thiserror::Error;

/// Errors that can occur while setting up a serial reader
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error(
        "Unable to open serial reader on port '{port}': {reason}. \
         Set the port to 'auto' to try auto-detection."
    )]
    DeviceOpen { port: String, reason: String },

    #[error("Unable to auto-detect serial reader port (tried: {})", tried.join(", "))]
    AutoDetectFailed { tried: Vec<String> },

    #[error("Invalid reader configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration file error: {0}")]
    Config(String),

    #[error("Failed to start polling thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl ReaderError {
    /// True if no device could be opened, either for an explicit path or
    /// after exhausting the auto-detection candidates.
    pub fn is_device_open(&self) -> bool {
        matches!(
            self,
            ReaderError::DeviceOpen { .. } | ReaderError::AutoDetectFailed { .. }
        )
    }
}
