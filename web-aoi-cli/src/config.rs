//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use web_aoi_processor::ProcessorConfig;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub processing: ProcessorConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Recording directory
    pub recording: Option<PathBuf>,
    /// AOI definitions (JSON) to validate before processing
    pub aois: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            write_summary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Surface tracker plugin (shared library)
    pub library: Option<PathBuf>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use web_aoi_processor::{TrailingGazePolicy, ViewportSize};

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            recording = "recordings/p01"

            [output]
            directory = "out/p01"

            [tracker]
            library = "libneon_tracker.so"

            [processing]
            trailing_gaze = "drop"

            [processing.layout]
            event_file = "events.txt"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.recording, Some(PathBuf::from("recordings/p01")));
        assert!(config.output.write_summary);
        assert_eq!(config.processing.trailing_gaze, TrailingGazePolicy::Drop);
        assert_eq!(config.processing.layout.event_file, "events.txt");
        assert_eq!(config.processing.layout.gaze_file, "gaze ps1.raw");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.recording.is_none());
        assert!(config.tracker.library.is_none());
        assert!(config.output.write_summary);
        assert_eq!(config.processing.initial_viewport, ViewportSize::new(1, 1));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nwrite_summary = false").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(!config.output.write_summary);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[processing]\ntrailing_gaze = \"sometimes\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
