//! Shared fixtures: an on-disk recording builder and a scripted tracker

#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use web_aoi_processor::{
    Calibration, CameraCalibration, FrameSource, GazePoint, MappedGaze, MarkerLayout,
    RecordingLayout, Result, SurfaceGaze, SurfaceHandle, SurfaceTracker, ViewportSize,
};

/// A call received by [`ScriptedTracker`]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    Establish {
        markers: MarkerLayout,
        size: ViewportSize,
    },
    Replace {
        previous: SurfaceHandle,
        markers: MarkerLayout,
        size: ViewportSize,
    },
    Project {
        frame: usize,
        gaze: Vec<GazePoint>,
    },
}

/// Tracker whose surfaces cover the whole scene image
///
/// Scene gaze maps unchanged onto every live surface and counts as on the
/// surface when it lies in the unit square.
#[derive(Debug, Default, Clone)]
pub struct ScriptedTracker {
    pub calls: Vec<TrackerCall>,
    live: BTreeSet<SurfaceHandle>,
    next_id: u64,
}

impl ScriptedTracker {
    pub fn establish_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, TrackerCall::Establish { .. }))
            .count()
    }

    pub fn replace_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, TrackerCall::Replace { .. }))
            .count()
    }

    fn allocate(&mut self) -> SurfaceHandle {
        self.next_id += 1;
        let handle = SurfaceHandle(self.next_id);
        self.live.insert(handle);
        handle
    }
}

impl SurfaceTracker for ScriptedTracker {
    type Frame = usize;

    fn establish(&mut self, markers: &MarkerLayout, size: ViewportSize) -> Result<SurfaceHandle> {
        self.calls.push(TrackerCall::Establish {
            markers: markers.clone(),
            size,
        });
        Ok(self.allocate())
    }

    fn replace(
        &mut self,
        handle: SurfaceHandle,
        markers: &MarkerLayout,
        size: ViewportSize,
    ) -> Result<SurfaceHandle> {
        self.calls.push(TrackerCall::Replace {
            previous: handle,
            markers: markers.clone(),
            size,
        });
        self.live.remove(&handle);
        Ok(self.allocate())
    }

    fn project(&mut self, frame: &usize, gaze: &[GazePoint]) -> Result<MappedGaze> {
        self.calls.push(TrackerCall::Project {
            frame: *frame,
            gaze: gaze.to_vec(),
        });

        let mapped: Vec<SurfaceGaze> = gaze
            .iter()
            .map(|g| {
                let on = (0.0..=1.0).contains(&g.x) && (0.0..=1.0).contains(&g.y);
                SurfaceGaze::new(g.x as f64, g.y as f64, on)
            })
            .collect();

        Ok(self
            .live
            .iter()
            .map(|handle| (*handle, mapped.clone()))
            .collect())
    }
}

/// Frame source that "decodes" a frame into its index
pub struct IndexFrames(pub usize);

impl FrameSource for IndexFrames {
    type Frame = usize;

    fn frame_count(&self) -> usize {
        self.0
    }

    fn decode(&mut self, index: usize) -> Result<usize> {
        Ok(index)
    }
}

fn camera(focal: f64) -> CameraCalibration {
    CameraCalibration {
        camera_matrix: [[focal, 0.0, 800.0], [0.0, focal, 600.0], [0.0, 0.0, 1.0]],
        distortion_coefficients: [0.0; 8],
        extrinsics_affine_matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    }
}

pub fn sample_calibration() -> Calibration {
    Calibration {
        version: 1,
        serial: *b"neon01",
        scene: camera(890.0),
        right_eye: camera(140.0),
        left_eye: camera(140.0),
        checksum: 0,
    }
}

/// Builds a recording directory in the device's on-disk layout
#[derive(Debug, Default, Clone)]
pub struct RecordingBuilder {
    pub frames: Vec<u64>,
    pub gaze: Vec<(u64, f32, f32)>,
    pub events: Vec<(u64, String)>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(mut self, timestamp: u64) -> Self {
        self.frames.push(timestamp);
        self
    }

    pub fn gaze(mut self, timestamp: u64, x: f32, y: f32) -> Self {
        self.gaze.push((timestamp, x, y));
        self
    }

    pub fn event(mut self, timestamp: u64, line: &str) -> Self {
        self.events.push((timestamp, line.to_string()));
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Write all files into `dir` and return it
    pub fn write(&self, dir: &Path) -> PathBuf {
        let layout = RecordingLayout::default();
        std::fs::create_dir_all(dir).unwrap();

        std::fs::write(
            layout.calibration_path(dir),
            sample_calibration().to_bytes(),
        )
        .unwrap();

        let video = layout.video_path(dir);
        write_timestamps(&RecordingLayout::timestamps_path(&video), &self.frames);

        let gaze = layout.gaze_path(dir);
        let gaze_ts: Vec<u64> = self.gaze.iter().map(|(t, _, _)| *t).collect();
        let gaze_xy: Vec<f32> = self.gaze.iter().flat_map(|(_, x, y)| [*x, *y]).collect();
        let mut bytes = vec![0u8; gaze_xy.len() * 4];
        LittleEndian::write_f32_into(&gaze_xy, &mut bytes);
        std::fs::write(&gaze, bytes).unwrap();
        write_timestamps(&RecordingLayout::timestamps_path(&gaze), &gaze_ts);

        let events = layout.event_path(dir);
        let event_ts: Vec<u64> = self.events.iter().map(|(t, _)| *t).collect();
        let mut text = String::new();
        for (_, line) in &self.events {
            text.push_str(line);
            text.push('\n');
        }
        std::fs::write(&events, text).unwrap();
        write_timestamps(&RecordingLayout::timestamps_path(&events), &event_ts);

        dir.to_path_buf()
    }
}

pub fn write_timestamps(path: &Path, timestamps: &[u64]) {
    let mut bytes = vec![0u8; timestamps.len() * 8];
    LittleEndian::write_u64_into(timestamps, &mut bytes);
    std::fs::write(path, bytes).unwrap();
}
