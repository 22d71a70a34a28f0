//! Serial port discovery and opening

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use tracing::{debug, info};

use super::{ReaderError, SerialConfig, AUTO_PORT};

/// Ports tried, in order, when auto-detection is requested
#[cfg(unix)]
pub const AUTO_DETECT_CANDIDATES: &[&str] = &[
    "/dev/ttyACM",
    "/dev/ttyACM0",
    "/dev/ttyACM1",
    "/dev/ttyUSB0",
    "/dev/ttyUSB1",
];

/// Ports tried, in order, when auto-detection is requested
#[cfg(windows)]
pub const AUTO_DETECT_CANDIDATES: &[&str] = &["COM3", "COM4", "COM5"];

/// Ports tried, in order, when auto-detection is requested
#[cfg(not(any(unix, windows)))]
pub const AUTO_DETECT_CANDIDATES: &[&str] = &[];

/// Which device the reader should use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    /// Try the auto-detection candidates in order
    Auto,
    /// Open exactly this path
    Explicit(String),
}

impl PortSpec {
    /// Interpret a user-supplied port string. Empty and "auto" request
    /// auto-detection.
    pub fn parse(port: &str) -> Self {
        let trimmed = port.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(AUTO_PORT) {
            PortSpec::Auto
        } else {
            PortSpec::Explicit(trimmed.to_string())
        }
    }
}

/// Open the device described by `spec` with the given settings.
///
/// Returns the path that was actually opened together with the port.
pub fn open_device<S: AsRef<str>>(
    spec: &PortSpec,
    candidates: &[S],
    config: &SerialConfig,
) -> Result<(String, Box<dyn SerialPort>), ReaderError> {
    match spec {
        PortSpec::Explicit(path) => {
            let port = open_path(path, config).map_err(|e| ReaderError::DeviceOpen {
                port: path.clone(),
                reason: e.to_string(),
            })?;
            Ok((path.clone(), port))
        }
        PortSpec::Auto => {
            for candidate in candidates {
                let path = candidate.as_ref();
                debug!("Try to open serial port '{}'", path);
                match open_path(path, config) {
                    Ok(port) => return Ok((path.to_string(), port)),
                    Err(e) => debug!("Serial port '{}' unavailable: {}", path, e),
                }
            }

            let present: Vec<String> = list_ports().into_iter().map(|p| p.name).collect();
            if !present.is_empty() {
                info!("Auto-detection failed; ports present: {}", present.join(", "));
            }
            Err(ReaderError::AutoDetectFailed {
                tried: candidates.iter().map(|c| c.as_ref().to_string()).collect(),
            })
        }
    }
}

fn open_path(path: &str, config: &SerialConfig) -> serialport::Result<Box<dyn SerialPort>> {
    let port = config.builder(path).open()?;
    info!(
        "Opened serial port {} ({} baud, {:?}/{:?}/{:?})",
        path, config.baud_rate, config.data_bits, config.parity, config.stop_bits
    );
    Ok(port)
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb_info) => Self {
                name: info.port_name,
                vid: Some(usb_info.vid),
                pid: Some(usb_info.pid),
                product: usb_info.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Arduino boards enumerate as ttyACM, USB-serial adapters as ttyUSB; list
/// them in that order, numerically by suffix, then everything else by name.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List serial ports present on this machine, in a deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Enumeration without udev misses ACM devices; pick them up from /dev
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}
