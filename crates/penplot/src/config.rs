//! Plotter configuration file.
//!
//! A single JSON document groups every tunable. Missing sections and
//! fields take their defaults; unknown fields are rejected so typos do
//! not silently fall back to defaults.
//!
//! ```json
//! {
//!   "machine": { "width": 800, "height": 600 },
//!   "path": { "line_spacing": 8 },
//!   "playback": { "speed": 30 },
//!   "serial": { "port": "/dev/ttyUSB0" }
//! }
//! ```

use std::path::{Path, PathBuf};

use penplot_pipeline::{MachineBounds, PathConfig};
use penplot_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Port to open on `simulate`, if any.
    pub port: Option<String>,
    /// Baud rate.
    pub baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: penplot_io::DEFAULT_BAUD,
        }
    }
}

/// Every tunable, grouped by concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotterConfig {
    /// Plottable area.
    pub machine: MachineBounds,
    /// Toolpath generation.
    pub path: PathConfig,
    /// Simulated playback.
    pub playback: PlaybackConfig,
    /// Hardware connection.
    pub serial: SerialConfig,
}

impl PlotterConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or unknown fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults.
    ///
    /// # Errors
    ///
    /// See [`PlotterConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = PlotterConfig::from_json("{}").unwrap();
        assert_eq!(config, PlotterConfig::default());
        assert_eq!(config.machine, MachineBounds::new(600.0, 400.0));
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.port, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PlotterConfig::from_json(
            r#"{"path": {"line_spacing": 6}, "playback": {"speed": 30}}"#,
        )
        .unwrap();
        assert_eq!(config.path.line_spacing, 6);
        assert_eq!(config.path.resolution, PathConfig::DEFAULT_RESOLUTION);
        assert_eq!(config.playback.speed, 30);
        assert_eq!(config.playback.log_every, 20);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(PlotterConfig::from_json(r#"{"machin": {}}"#).is_err());
        assert!(PlotterConfig::from_json(r#"{"path": {"spacing": 3}}"#).is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"machine": {{"width": 800, "height": 500}}, "serial": {{"port": "/dev/ttyUSB0"}}}}"#
        )
        .unwrap();
        let config = PlotterConfig::load(file.path()).unwrap();
        assert_eq!(config.machine, MachineBounds::new(800.0, 500.0));
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = PlotterConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.json"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(
            PlotterConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(
            PlotterConfig::load_or_default(None).unwrap(),
            PlotterConfig::default()
        );
    }
}
