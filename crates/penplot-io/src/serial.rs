//! Serial connection to the plotter.
//!
//! Opening the port is the whole job: the simulated plot never sends
//! motion commands, so the link only proves the hardware is reachable and
//! keeps the port claimed while the session runs. Failures are reported
//! as a [`ConnectionStatus`] and never stop generation or playback.

use std::fmt;
use std::time::Duration;

use penplot_playback::ConnectionStatus;
use serialport::SerialPort;

/// Baud rate used when none is configured.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Read/write timeout for the open port.
const PORT_TIMEOUT: Duration = Duration::from_millis(100);

/// Errors from opening or enumerating serial ports.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The port could not be opened.
    #[error("failed to open {port}: {source}")]
    Open {
        /// Port name as given.
        port: String,
        /// Underlying driver error.
        source: serialport::Error,
    },

    /// Port enumeration failed.
    #[error("failed to list serial ports: {0}")]
    List(#[from] serialport::Error),
}

/// An open serial port.
pub struct SerialLink {
    port_name: String,
    baud: u32,
    _port: Box<dyn SerialPort>,
}

impl fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialLink")
            .field("port_name", &self.port_name)
            .field("baud", &self.baud)
            .finish_non_exhaustive()
    }
}

impl SerialLink {
    /// Open `port_name` at `baud`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Open`] if the port does not exist, is
    /// busy, or access is denied.
    pub fn connect(port_name: &str, baud: u32) -> Result<Self, ConnectionError> {
        let port = serialport::new(port_name, baud)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|source| ConnectionError::Open {
                port: port_name.to_owned(),
                source,
            })?;
        tracing::info!(port = port_name, baud, "serial port opened");
        Ok(Self {
            port_name: port_name.to_owned(),
            baud,
            _port: port,
        })
    }

    /// Name of the open port.
    #[must_use]
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Baud rate the port was opened at.
    #[must_use]
    pub const fn baud(&self) -> u32 {
        self.baud
    }

    /// Session status describing this link.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::Connected(self.port_name.clone())
    }
}

/// Try to open `port_name`, turning the outcome into a status.
///
/// Returns the link on success so the caller can keep the port claimed.
#[must_use]
pub fn connect_with_status(port_name: &str, baud: u32) -> (Option<SerialLink>, ConnectionStatus) {
    match SerialLink::connect(port_name, baud) {
        Ok(link) => {
            let status = link.status();
            (Some(link), status)
        }
        Err(e) => (None, ConnectionStatus::Failed(e.to_string())),
    }
}

/// Enumerate serial ports, sorted by name.
///
/// Falls back to scanning `/dev` for USB serial adapters when the system
/// API reports nothing.
///
/// # Errors
///
/// Returns [`ConnectionError::List`] if the system API fails.
pub fn list_ports() -> Result<Vec<String>, ConnectionError> {
    let mut ports: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect();

    if ports.is_empty() {
        ports = scan_dev(std::path::Path::new("/dev"));
    }

    ports.sort();
    ports.dedup();
    Ok(ports)
}

/// Names of `ttyUSB*` / `ttyACM*` entries under `dir`.
fn scan_dev(dir: &std::path::Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            (name.starts_with("ttyUSB") || name.starts_with("ttyACM"))
                .then(|| dir.join(name).to_string_lossy().into_owned())
        })
        .collect()
}
