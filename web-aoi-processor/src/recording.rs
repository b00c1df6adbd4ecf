//! Loading the timestamped tracks of a recording directory
//!
//! Every track is stored as a data file plus a parallel `.time` file of
//! little-endian `u64` nanosecond timestamps, one per entry:
//! - events: newline-delimited text
//! - gaze: little-endian `f32` (x, y) pairs in normalized scene-camera space
//! - video: one timestamp per decodable frame (frames are decoded on demand
//!   by a [`crate::FrameSource`])

use crate::calibration::Calibration;
use crate::config::RecordingLayout;
use crate::timeline::TimedSeries;
use crate::types::{GazePoint, Result, WebAoiError};
use byteorder::{ByteOrder, LittleEndian};
use std::path::{Path, PathBuf};

/// All inputs of one processing run, loaded into memory
#[derive(Debug)]
pub struct Recording {
    pub path: PathBuf,
    pub calibration: Calibration,
    /// Frame index by frame timestamp
    pub video_frames: TimedSeries<usize>,
    pub gaze: TimedSeries<GazePoint>,
    pub events: TimedSeries<String>,
}

impl Recording {
    /// Load calibration and all three tracks from a recording directory
    pub fn load(dir: &Path, layout: &RecordingLayout) -> Result<Self> {
        log::info!("Loading recording: {:?}", dir);

        if !dir.is_dir() {
            return Err(WebAoiError::InputError(format!(
                "Recording directory not found: {:?}",
                dir
            )));
        }

        let calibration = Calibration::from_file(&layout.calibration_path(dir))?;

        let video_timestamps =
            read_timestamps(&RecordingLayout::timestamps_path(&layout.video_path(dir)))?;
        let frame_indices = (0..video_timestamps.len()).collect();
        let video_frames = with_context(TimedSeries::new(video_timestamps, frame_indices), "video")?;

        let gaze_path = layout.gaze_path(dir);
        let gaze = with_context(
            TimedSeries::new(
                read_timestamps(&RecordingLayout::timestamps_path(&gaze_path))?,
                read_gaze(&gaze_path)?,
            ),
            "gaze",
        )?;

        let event_path = layout.event_path(dir);
        let events = with_context(
            TimedSeries::new(
                read_timestamps(&RecordingLayout::timestamps_path(&event_path))?,
                read_event_lines(&event_path)?,
            ),
            "events",
        )?;

        log::info!(
            "Recording loaded: {} frames, {} gaze samples, {} events",
            video_frames.len(),
            gaze.len(),
            events.len()
        );
        if let (Some(first), Some(last)) = (gaze.first_timestamp(), gaze.last_timestamp()) {
            log::debug!("Gaze spans {} ns ({} .. {})", last - first, first, last);
        }

        Ok(Self {
            path: dir.to_path_buf(),
            calibration,
            video_frames,
            gaze,
            events,
        })
    }
}

fn with_context<T>(result: Result<T>, track: &str) -> Result<T> {
    result.map_err(|e| match e {
        WebAoiError::InputError(msg) => WebAoiError::InputError(format!("{} track: {}", track, msg)),
        other => other,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        WebAoiError::InputError(format!("Failed to read {:?}: {}", path, e))
    })
}

/// Read a `.time` file of little-endian `u64` nanosecond timestamps
pub fn read_timestamps(path: &Path) -> Result<Vec<u64>> {
    let bytes = read_file(path)?;
    if bytes.len() % 8 != 0 {
        return Err(WebAoiError::InputError(format!(
            "Timestamp file {:?} has {} bytes, not a multiple of 8",
            path,
            bytes.len()
        )));
    }

    let mut timestamps = vec![0u64; bytes.len() / 8];
    LittleEndian::read_u64_into(&bytes, &mut timestamps);
    log::debug!("Read {} timestamps from {:?}", timestamps.len(), path);
    Ok(timestamps)
}

/// Read a raw gaze file of little-endian `f32` (x, y) pairs
pub fn read_gaze(path: &Path) -> Result<Vec<GazePoint>> {
    let bytes = read_file(path)?;
    if bytes.len() % 8 != 0 {
        return Err(WebAoiError::InputError(format!(
            "Gaze file {:?} has {} bytes, not a whole number of (x, y) pairs",
            path,
            bytes.len()
        )));
    }

    let mut values = vec![0f32; bytes.len() / 4];
    LittleEndian::read_f32_into(&bytes, &mut values);
    Ok(values
        .chunks_exact(2)
        .map(|pair| GazePoint::new(pair[0], pair[1]))
        .collect())
}

/// Read the event text file, one entry per line
pub fn read_event_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = read_file(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().map(str::to_string).collect())
}
