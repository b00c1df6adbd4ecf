//! Web AOI Recording Processor
//!
//! Post-processes an eye-tracking recording made while a participant browsed
//! web pages. A recording holds three independently clocked tracks (scene
//! video frames, gaze samples and browser events); this library merges them
//! in causal order, keeps per-tab page state up to date from the events, and
//! attributes every gaze sample to page coordinates and named areas of
//! interest (AOIs).
//!
//! # Architecture
//!
//! - [`timeline`]: timestamp-ordered series and forward-only windowed reads
//! - [`events`]: event line grammar and typed browser events
//! - [`tab`]: per-tab geometry, scroll state and CSV sinks
//! - [`processor`]: the synchronizer driving everything frame by frame
//!
//! The library does NOT:
//! - Drive a browser or inject marker tags
//! - Detect markers or compute homographies ([`SurfaceTracker`])
//! - Decode video ([`FrameSource`])
//! - Render heatmaps
//!
//! # Example Usage
//!
//! ```no_run
//! use web_aoi_processor::{
//!     FrameSource, GazePoint, MappedGaze, MarkerLayout, ProcessorConfig, Result,
//!     SurfaceHandle, SurfaceTracker, ViewportSize,
//! };
//! use std::path::Path;
//!
//! struct MyTracker;
//!
//! impl SurfaceTracker for MyTracker {
//!     type Frame = Vec<u8>;
//!     fn establish(&mut self, _: &MarkerLayout, _: ViewportSize) -> Result<SurfaceHandle> {
//!         Ok(SurfaceHandle(0))
//!     }
//!     fn replace(&mut self, h: SurfaceHandle, _: &MarkerLayout, _: ViewportSize) -> Result<SurfaceHandle> {
//!         Ok(h)
//!     }
//!     fn project(&mut self, _: &Vec<u8>, _: &[GazePoint]) -> Result<MappedGaze> {
//!         Ok(MappedGaze::new())
//!     }
//! }
//!
//! struct MyFrames(usize);
//!
//! impl FrameSource for MyFrames {
//!     type Frame = Vec<u8>;
//!     fn frame_count(&self) -> usize { self.0 }
//!     fn decode(&mut self, _: usize) -> Result<Vec<u8>> { Ok(Vec::new()) }
//! }
//!
//! let summary = web_aoi_processor::process_recording(
//!     Path::new("recordings/2024-05-01"),
//!     Path::new("out"),
//!     ProcessorConfig::new(),
//!     |_calibration, _video| Ok((MyTracker, MyFrames(1800))),
//! )
//! .unwrap();
//!
//! println!("{} gaze rows written", summary.gaze_rows);
//! ```

// Public modules
pub mod aoi_definitions;
pub mod calibration;
pub mod config;
pub mod events;
pub mod output;
pub mod processor;
pub mod recording;
pub mod summary;
pub mod tab;
pub mod timeline;
pub mod tracker;
pub mod types;

// Re-export main types for convenience
pub use aoi_definitions::{AoiDefinitions, LocatorArg, LocatorKind, LocatorStep};
pub use calibration::{Calibration, CameraCalibration, CALIBRATION_RECORD_SIZE};
pub use config::{ProcessorConfig, RecordingLayout, TrailingGazePolicy};
pub use events::{BrowserEvent, EventParser};
pub use processor::RecordingProcessor;
pub use recording::Recording;
pub use summary::ProcessingSummary;
pub use tab::{MarkerLayout, TabState};
pub use timeline::{Horizon, TimedSeries, WindowedSource};
pub use tracker::{FrameSource, MappedGaze, SurfaceTracker};
pub use types::{
    GazePoint, Point2, Rect, Result, SurfaceGaze, SurfaceHandle, Timestamp, ViewportSize,
    WebAoiError,
};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load a recording directory and run the full pipeline over it
///
/// `connect` receives the recording's calibration and the path of its scene
/// video and returns the surface tracker and frame source to use.
pub fn process_recording<T, V, F>(
    recording_dir: &Path,
    output_dir: &Path,
    config: ProcessorConfig,
    connect: F,
) -> Result<ProcessingSummary>
where
    T: SurfaceTracker,
    V: FrameSource<Frame = T::Frame>,
    F: FnOnce(&Calibration, &Path) -> Result<(T, V)>,
{
    let recording = Recording::load(recording_dir, &config.layout)?;
    let video_path = config.layout.video_path(recording_dir);
    let (tracker, frames) = connect(&recording.calibration, &video_path)?;

    let mut processor = RecordingProcessor::new(recording, tracker, frames, output_dir, config)?;
    processor.process()
}
