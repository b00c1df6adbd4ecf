//! C ABI of surface tracker plugins
//!
//! A tracker plugin is a shared library exporting the functions below. It
//! owns the scene video decoder and the marker-based surface tracker; the
//! CLI only passes marker layouts and gaze in and reads mapped gaze out.
//!
//! Every function except `create`, `destroy` and `last_error` returns a
//! status code (see [`TrackerStatus`]). After a failure
//! `web_aoi_tracker_last_error` describes what went wrong.

use libloading::Library;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;

/// One marker: its id and corner points in page pixels, clockwise from the
/// top-left
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebAoiMarker {
    pub marker_id: u32,
    pub corners: [[f64; 2]; 4],
}

/// One scene camera gaze sample
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebAoiGaze {
    pub x: f32,
    pub y: f32,
}

/// One gaze sample mapped onto one surface
///
/// `gaze_index` refers to the position in the input gaze array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebAoiMappedGaze {
    pub surface: u64,
    pub gaze_index: u32,
    pub x: f64,
    pub y: f64,
    pub on_surface: u8,
}

/// Status codes returned by plugin calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Ok,
    Failed,
    /// Output buffer too small; the required length was written back
    BufferTooSmall,
    NullHandle,
    Unrecognized(c_int),
}

impl TrackerStatus {
    pub fn from_code(code: c_int) -> Self {
        match code {
            0 => TrackerStatus::Ok,
            1 => TrackerStatus::Failed,
            2 => TrackerStatus::BufferTooSmall,
            3 => TrackerStatus::NullHandle,
            other => TrackerStatus::Unrecognized(other),
        }
    }
}

pub type TrackerHandle = *mut c_void;

pub type CreateFn = unsafe extern "C" fn(
    video_path: *const c_char,
    calibration: *const u8,
    calibration_len: usize,
) -> TrackerHandle;
pub type DestroyFn = unsafe extern "C" fn(tracker: TrackerHandle);
pub type FrameCountFn = unsafe extern "C" fn(tracker: TrackerHandle, count: *mut u64) -> c_int;
pub type DecodeFrameFn = unsafe extern "C" fn(tracker: TrackerHandle, index: u64) -> c_int;
pub type AddSurfaceFn = unsafe extern "C" fn(
    tracker: TrackerHandle,
    markers: *const WebAoiMarker,
    marker_count: usize,
    width: u32,
    height: u32,
    surface: *mut u64,
) -> c_int;
pub type ReplaceSurfaceFn = unsafe extern "C" fn(
    tracker: TrackerHandle,
    previous: u64,
    markers: *const WebAoiMarker,
    marker_count: usize,
    width: u32,
    height: u32,
    surface: *mut u64,
) -> c_int;
pub type MapGazeFn = unsafe extern "C" fn(
    tracker: TrackerHandle,
    frame_index: u64,
    gaze: *const WebAoiGaze,
    gaze_count: usize,
    mapped: *mut WebAoiMappedGaze,
    capacity: usize,
    mapped_len: *mut usize,
) -> c_int;
pub type LastErrorFn = unsafe extern "C" fn() -> *const c_char;

/// Resolved plugin entry points
///
/// The function pointers are only valid while `_library` is loaded, which
/// holds for as long as this struct lives.
pub struct TrackerApi {
    pub create: CreateFn,
    pub destroy: DestroyFn,
    pub frame_count: FrameCountFn,
    pub decode_frame: DecodeFrameFn,
    pub add_surface: AddSurfaceFn,
    pub replace_surface: ReplaceSurfaceFn,
    pub map_gaze: MapGazeFn,
    pub last_error: LastErrorFn,
    _library: Library,
}

impl TrackerApi {
    /// Load a plugin library and resolve every entry point
    pub fn load(path: &Path) -> Result<Self, libloading::Error> {
        unsafe {
            let library = Library::new(path)?;
            Ok(Self {
                create: *library.get::<CreateFn>(b"web_aoi_tracker_create\0")?,
                destroy: *library.get::<DestroyFn>(b"web_aoi_tracker_destroy\0")?,
                frame_count: *library.get::<FrameCountFn>(b"web_aoi_tracker_frame_count\0")?,
                decode_frame: *library.get::<DecodeFrameFn>(b"web_aoi_tracker_decode_frame\0")?,
                add_surface: *library.get::<AddSurfaceFn>(b"web_aoi_tracker_add_surface\0")?,
                replace_surface: *library
                    .get::<ReplaceSurfaceFn>(b"web_aoi_tracker_replace_surface\0")?,
                map_gaze: *library.get::<MapGazeFn>(b"web_aoi_tracker_map_gaze\0")?,
                last_error: *library.get::<LastErrorFn>(b"web_aoi_tracker_last_error\0")?,
                _library: library,
            })
        }
    }

    /// Message describing the plugin's most recent failure
    pub fn last_error_message(&self) -> String {
        unsafe {
            let ptr = (self.last_error)();
            if ptr.is_null() {
                return String::from("Unknown error");
            }
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}
