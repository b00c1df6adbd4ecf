//! Capabilities provided by external collaborators
//!
//! Marker detection, homography estimation and video decoding are not part
//! of this crate. The processor drives them through two traits:
//! - [`SurfaceTracker`] registers marker layouts as surfaces and maps gaze
//!   onto them for a given frame
//! - [`FrameSource`] decodes scene-camera frames by index

use crate::tab::MarkerLayout;
use crate::types::{GazePoint, Result, SurfaceGaze, SurfaceHandle, ViewportSize};
use std::collections::HashMap;

/// Gaze mapped onto every surface visible in a frame
pub type MappedGaze = HashMap<SurfaceHandle, Vec<SurfaceGaze>>;

/// Planar surface tracker
pub trait SurfaceTracker {
    /// Decoded frame type the tracker locates markers in
    type Frame;

    /// Register a surface for a marker layout shown in a viewport of `size`
    fn establish(&mut self, markers: &MarkerLayout, size: ViewportSize) -> Result<SurfaceHandle>;

    /// Replace a previously registered surface with a new layout
    fn replace(
        &mut self,
        handle: SurfaceHandle,
        markers: &MarkerLayout,
        size: ViewportSize,
    ) -> Result<SurfaceHandle>;

    /// Map scene-camera gaze onto the surfaces located in `frame`
    fn project(&mut self, frame: &Self::Frame, gaze: &[GazePoint]) -> Result<MappedGaze>;
}

/// Random-access decoder of scene-camera frames
pub trait FrameSource {
    type Frame;

    /// Number of decodable frames
    fn frame_count(&self) -> usize;

    /// Decode the frame at `index`
    fn decode(&mut self, index: usize) -> Result<Self::Frame>;
}
