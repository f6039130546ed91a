//! Serial port sink
//!
//! Provides the hardware sink for drawing controllers attached over USB or
//! RS-232.
//!
//! Supports:
//! - Port enumeration and discovery
//! - Automatic port selection
//! - A settle delay after opening while the controller resets
//! - Newline-terminated, flushed writes

use crate::sink::{terminated, MotionSink};
use scaradraw_core::ConnectionError;
use std::io::Write;
use std::time::Duration;

/// Port name that selects the first matching controller port
pub const AUTO_PORT: &str = "Auto";

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List serial ports that look like a drawing controller
///
/// Filters to the usual USB-serial patterns:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ConnectionError> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ConnectionError::SerialError {
            reason: format!("Failed to enumerate ports: {}", e),
        }
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb_info) => {
                    let info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                    match &usb_info.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

/// Check if a port name matches a controller pattern
fn is_controller_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Serial connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialParams {
    /// Port name, or [`AUTO_PORT`]
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Write timeout in milliseconds
    pub timeout_ms: u64,
    /// Wait after opening before the port reports ready, in milliseconds
    pub settle_ms: u64,
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: 115200,
            timeout_ms: 1000,
            settle_ms: 2000,
        }
    }
}

impl SerialParams {
    /// Parameters for a named port with default timing
    pub fn for_port(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ConnectionError> {
        if self.port.trim().is_empty() {
            return Err(ConnectionError::InvalidParameters {
                reason: "port name is empty".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConnectionError::InvalidParameters {
                reason: "baud rate must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Sink writing commands to a serial port
pub struct SerialSink {
    params: SerialParams,
    resolved_port: Option<String>,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialSink {
    pub fn new(params: SerialParams) -> Self {
        Self {
            params,
            resolved_port: None,
            port: None,
        }
    }

    pub fn params(&self) -> &SerialParams {
        &self.params
    }

    fn resolve_port(&self) -> Result<String, ConnectionError> {
        if !self.params.port.eq_ignore_ascii_case(AUTO_PORT) {
            return Ok(self.params.port.clone());
        }
        list_ports()?
            .into_iter()
            .next()
            .map(|info| info.port_name)
            .ok_or_else(|| ConnectionError::PortNotFound {
                port: AUTO_PORT.to_string(),
            })
    }
}

impl std::fmt::Debug for SerialSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSink")
            .field("params", &self.params)
            .field("resolved_port", &self.resolved_port)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl MotionSink for SerialSink {
    fn name(&self) -> String {
        self.resolved_port
            .clone()
            .unwrap_or_else(|| self.params.port.clone())
    }

    fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.port.is_some() {
            return Ok(());
        }
        self.params.validate()?;
        let port_name = self.resolve_port()?;

        let mut port = serialport::new(&port_name, self.params.baud_rate)
            .timeout(Duration::from_millis(self.params.timeout_ms))
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", port_name, e);
                ConnectionError::FailedToOpen {
                    port: port_name.clone(),
                    reason: e.to_string(),
                }
            })?;

        // Opening the port resets most USB controllers
        std::thread::sleep(Duration::from_millis(self.params.settle_ms));
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            tracing::debug!("Could not clear input buffer on {}: {}", port_name, e);
        }

        tracing::info!(
            "Opened {} at {} baud",
            port_name,
            self.params.baud_rate
        );
        self.resolved_port = Some(port_name);
        self.port = Some(port);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), ConnectionError> {
        if let Some(mut port) = self.port.take() {
            port.flush()?;
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.port.is_some()
    }

    fn send(&mut self, command: &str) -> Result<(), ConnectionError> {
        write_line(&mut self.port, command)
    }
}

/// Write one terminated command to `slot`
///
/// A failed write closes the port, so the sink stops reporting ready.
fn write_line<P: Write + ?Sized>(
    slot: &mut Option<Box<P>>,
    command: &str,
) -> Result<(), ConnectionError> {
    let port = slot.as_mut().ok_or(ConnectionError::NotConnected)?;
    let line = terminated(command);

    let written = port.write_all(line.as_bytes()).and_then(|_| port.flush());
    if let Err(e) = written {
        tracing::error!("Serial write failed, closing port: {}", e);
        *slot = None;
        return Err(ConnectionError::WriteFailed {
            command: line.trim_end().to_string(),
            reason: e.to_string(),
        });
    }

    tracing::debug!("-> {}", line.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_port_patterns() {
        assert!(is_controller_port("COM3"));
        assert!(is_controller_port("/dev/ttyUSB0"));
        assert!(is_controller_port("/dev/ttyACM1"));
        assert!(is_controller_port("/dev/cu.usbserial-1420"));
        assert!(is_controller_port("/dev/cu.usbmodem14101"));

        assert!(!is_controller_port("COM"));
        assert!(!is_controller_port("COMX"));
        assert!(!is_controller_port("/dev/ttyS0"));
        assert!(!is_controller_port("/dev/cu.Bluetooth-Incoming-Port"));
    }

    #[test]
    fn test_default_params() {
        let params = SerialParams::default();
        assert_eq!(params.port, AUTO_PORT);
        assert_eq!(params.baud_rate, 115200);
        assert_eq!(params.settle_ms, 2000);
    }

    #[test]
    fn test_invalid_params_rejected_before_open() {
        let mut sink = SerialSink::new(SerialParams::for_port("/dev/ttyUSB9", 0));
        assert!(matches!(
            sink.connect(),
            Err(ConnectionError::InvalidParameters { .. })
        ));
        assert!(!sink.is_ready());
    }

    struct Unplugged;

    impl Write for Unplugged {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_closes_port() {
        let mut slot: Option<Box<Unplugged>> = Some(Box::new(Unplugged));

        assert!(matches!(
            write_line(&mut slot, "HOME"),
            Err(ConnectionError::WriteFailed { ref command, .. }) if command == "HOME"
        ));
        assert!(slot.is_none());
        assert!(matches!(
            write_line(&mut slot, "PU"),
            Err(ConnectionError::NotConnected)
        ));
    }

    #[test]
    fn test_send_without_connection() {
        let mut sink = SerialSink::new(SerialParams::for_port("/dev/ttyUSB9", 115200));
        assert!(matches!(sink.send("HOME"), Err(ConnectionError::NotConnected)));
        assert_eq!(sink.name(), "/dev/ttyUSB9");
    }
}
