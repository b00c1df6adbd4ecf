//! Processor configuration types
//!
//! This module defines the small amount of configuration the processing
//! pipeline needs: where the streams live inside a recording directory,
//! how to treat gaze recorded after the last video frame, and the viewport
//! size assumed before the browser reports one.

use crate::types::ViewportSize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a processing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// File names of the streams inside the recording directory
    #[serde(default)]
    pub layout: RecordingLayout,

    /// What to do with gaze samples recorded after the last video frame
    #[serde(default)]
    pub trailing_gaze: TrailingGazePolicy,

    /// Viewport size assumed until the first `browser_size` event
    #[serde(default)]
    pub initial_viewport: ViewportSize,
}

/// Policy for gaze samples whose timestamp is past the last video frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingGazePolicy {
    /// Attribute them using the last decoded frame and last known surface
    #[default]
    ReuseLastFrame,
    /// Discard them
    Drop,
}

/// Names of the stream files within a recording directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingLayout {
    /// Scene camera video
    #[serde(default = "default_video_file")]
    pub video_file: String,

    /// Newline-delimited browser events
    #[serde(default = "default_event_file")]
    pub event_file: String,

    /// Raw little-endian f32 gaze pairs
    #[serde(default = "default_gaze_file")]
    pub gaze_file: String,

    /// Binary camera calibration record
    #[serde(default = "default_calibration_file")]
    pub calibration_file: String,
}

fn default_video_file() -> String {
    "Neon Scene Camera v1 ps1.mp4".to_string()
}

fn default_event_file() -> String {
    "event.txt".to_string()
}

fn default_gaze_file() -> String {
    "gaze ps1.raw".to_string()
}

fn default_calibration_file() -> String {
    "calibration.bin".to_string()
}

impl Default for RecordingLayout {
    fn default() -> Self {
        Self {
            video_file: default_video_file(),
            event_file: default_event_file(),
            gaze_file: default_gaze_file(),
            calibration_file: default_calibration_file(),
        }
    }
}

impl RecordingLayout {
    pub fn video_path(&self, recording_dir: &Path) -> PathBuf {
        recording_dir.join(&self.video_file)
    }

    pub fn event_path(&self, recording_dir: &Path) -> PathBuf {
        recording_dir.join(&self.event_file)
    }

    pub fn gaze_path(&self, recording_dir: &Path) -> PathBuf {
        recording_dir.join(&self.gaze_file)
    }

    pub fn calibration_path(&self, recording_dir: &Path) -> PathBuf {
        recording_dir.join(&self.calibration_file)
    }

    /// Timestamp file paired with a stream data file (`<stem>.time`)
    pub fn timestamps_path(data_path: &Path) -> PathBuf {
        data_path.with_extension("time")
    }
}

impl ProcessorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the recording file layout
    pub fn with_layout(mut self, layout: RecordingLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Builder method: set the trailing gaze policy
    pub fn with_trailing_gaze(mut self, policy: TrailingGazePolicy) -> Self {
        self.trailing_gaze = policy;
        self
    }

    /// Builder method: set the viewport assumed before the first resize event
    pub fn with_initial_viewport(mut self, width: u32, height: u32) -> Self {
        self.initial_viewport = ViewportSize::new(width, height);
        self
    }
}
