//! Surface tracking through a dynamically loaded plugin
//!
//! The plugin session is shared by two views: [`PluginTracker`] implements
//! [`SurfaceTracker`] and [`PluginFrames`] implements [`FrameSource`]. The
//! plugin keeps decoded frames itself, so a frame on the Rust side is just
//! its index.

use crate::plugin_ffi::*;
use std::ffi::CString;
use std::path::Path;
use std::rc::Rc;
use web_aoi_processor::{
    Calibration, FrameSource, GazePoint, MappedGaze, MarkerLayout, Result, SurfaceGaze,
    SurfaceHandle, SurfaceTracker, ViewportSize, WebAoiError,
};

/// A frame decoded and held by the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginFrame {
    pub index: u64,
}

/// An open plugin session for one recording
struct TrackerSession {
    api: TrackerApi,
    handle: TrackerHandle,
}

impl TrackerSession {
    fn failure(&self, operation: &str, status: TrackerStatus) -> String {
        format!(
            "{} failed: {} ({:?})",
            operation,
            self.api.last_error_message(),
            status
        )
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { (self.api.destroy)(self.handle) };
        }
    }
}

/// Load the plugin at `library` and open a session for a recording
pub fn open(
    library: &Path,
    video_path: &Path,
    calibration: &Calibration,
) -> Result<(PluginTracker, PluginFrames)> {
    log::info!("Loading tracker plugin: {:?}", library);

    let api = TrackerApi::load(library).map_err(|e| {
        WebAoiError::TrackerError(format!("Failed to load plugin {:?}: {}", library, e))
    })?;

    let path_str = video_path.to_str().ok_or_else(|| {
        WebAoiError::TrackerError(format!("Invalid UTF-8 in path: {:?}", video_path))
    })?;
    let c_path = CString::new(path_str).map_err(|e| {
        WebAoiError::TrackerError(format!("Failed to convert path to C string: {}", e))
    })?;

    let calibration = calibration.to_bytes();
    let handle = unsafe { (api.create)(c_path.as_ptr(), calibration.as_ptr(), calibration.len()) };
    if handle.is_null() {
        return Err(WebAoiError::TrackerError(format!(
            "Failed to open {:?}: {}",
            video_path,
            api.last_error_message()
        )));
    }

    let session = TrackerSession { api, handle };

    let mut count = 0u64;
    let code = unsafe { (session.api.frame_count)(session.handle, &mut count) };
    let status = TrackerStatus::from_code(code);
    if status != TrackerStatus::Ok {
        return Err(WebAoiError::FrameDecodeError(
            session.failure("Reading frame count", status),
        ));
    }
    log::info!("Tracker plugin opened {:?} ({} frames)", video_path, count);

    let session = Rc::new(session);
    Ok((
        PluginTracker {
            session: Rc::clone(&session),
        },
        PluginFrames {
            session,
            frame_count: count as usize,
        },
    ))
}

fn to_ffi_markers(markers: &MarkerLayout) -> Vec<WebAoiMarker> {
    markers
        .iter()
        .map(|(id, corners)| WebAoiMarker {
            marker_id: *id,
            corners: corners.map(|p| [p.x, p.y]),
        })
        .collect()
}

/// [`SurfaceTracker`] backed by the plugin
pub struct PluginTracker {
    session: Rc<TrackerSession>,
}

impl PluginTracker {
    fn register(
        &mut self,
        previous: Option<SurfaceHandle>,
        markers: &MarkerLayout,
        size: ViewportSize,
    ) -> Result<SurfaceHandle> {
        let session = &self.session;
        let markers = to_ffi_markers(markers);
        let mut surface = 0u64;

        let code = unsafe {
            match previous {
                None => (session.api.add_surface)(
                    session.handle,
                    markers.as_ptr(),
                    markers.len(),
                    size.width,
                    size.height,
                    &mut surface,
                ),
                Some(previous) => (session.api.replace_surface)(
                    session.handle,
                    previous.0,
                    markers.as_ptr(),
                    markers.len(),
                    size.width,
                    size.height,
                    &mut surface,
                ),
            }
        };

        match TrackerStatus::from_code(code) {
            TrackerStatus::Ok => Ok(SurfaceHandle(surface)),
            status => Err(WebAoiError::TrackerError(
                session.failure("Surface registration", status),
            )),
        }
    }
}

impl SurfaceTracker for PluginTracker {
    type Frame = PluginFrame;

    fn establish(&mut self, markers: &MarkerLayout, size: ViewportSize) -> Result<SurfaceHandle> {
        self.register(None, markers, size)
    }

    fn replace(
        &mut self,
        handle: SurfaceHandle,
        markers: &MarkerLayout,
        size: ViewportSize,
    ) -> Result<SurfaceHandle> {
        self.register(Some(handle), markers, size)
    }

    fn project(&mut self, frame: &PluginFrame, gaze: &[GazePoint]) -> Result<MappedGaze> {
        let session = &self.session;
        let input: Vec<WebAoiGaze> = gaze.iter().map(|g| WebAoiGaze { x: g.x, y: g.y }).collect();

        let mut output = vec![WebAoiMappedGaze::default(); input.len().max(1) * 4];
        loop {
            let mut written = 0usize;
            let code = unsafe {
                (session.api.map_gaze)(
                    session.handle,
                    frame.index,
                    input.as_ptr(),
                    input.len(),
                    output.as_mut_ptr(),
                    output.len(),
                    &mut written,
                )
            };

            match TrackerStatus::from_code(code) {
                TrackerStatus::Ok => {
                    output.truncate(written.min(output.len()));
                    break;
                }
                TrackerStatus::BufferTooSmall if written > output.len() => {
                    log::trace!("Growing mapped gaze buffer to {}", written);
                    output.resize(written, WebAoiMappedGaze::default());
                }
                status => {
                    return Err(WebAoiError::TrackerError(
                        session.failure("Gaze mapping", status),
                    ))
                }
            }
        }

        let mut mapped = MappedGaze::new();
        for entry in output {
            mapped
                .entry(SurfaceHandle(entry.surface))
                .or_insert_with(Vec::new)
                .push(SurfaceGaze::new(entry.x, entry.y, entry.on_surface != 0));
        }
        Ok(mapped)
    }
}

/// [`FrameSource`] backed by the plugin's video decoder
pub struct PluginFrames {
    session: Rc<TrackerSession>,
    frame_count: usize,
}

impl FrameSource for PluginFrames {
    type Frame = PluginFrame;

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn decode(&mut self, index: usize) -> Result<PluginFrame> {
        let session = &self.session;
        let index = index as u64;
        let code = unsafe { (session.api.decode_frame)(session.handle, index) };
        match TrackerStatus::from_code(code) {
            TrackerStatus::Ok => Ok(PluginFrame { index }),
            status => Err(WebAoiError::FrameDecodeError(
                session.failure(&format!("Decoding frame {}", index), status),
            )),
        }
    }
}
