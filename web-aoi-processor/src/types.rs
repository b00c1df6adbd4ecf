//! Core types for the web AOI recording processor
//!
//! This module defines the geometric primitives, gaze sample types and the
//! error type shared by every stage of the pipeline. Timestamps are kept as
//! raw nanoseconds internally and only converted to calendar time for
//! reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar timestamp type used in summaries
pub type Timestamp = DateTime<Utc>;

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, WebAoiError>;

/// Convert a nanosecond unix timestamp to a calendar timestamp
pub fn timestamp_from_ns(timestamp_ns: u64) -> Timestamp {
    let secs = (timestamp_ns / 1_000_000_000) as i64;
    let nsecs = (timestamp_ns % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nsecs).unwrap_or_default()
}

/// Errors that can occur while loading or processing a recording
#[derive(Debug, thiserror::Error)]
pub enum WebAoiError {
    #[error("Invalid input: {0}")]
    InputError(String),

    #[error("Failed to load calibration: {0}")]
    CalibrationError(String),

    #[error("Malformed event: {0}")]
    EventParseError(String),

    #[error("Surface tracker error: {0}")]
    TrackerError(String),

    #[error("Failed to decode frame: {0}")]
    FrameDecodeError(String),

    #[error("Invalid AOI definition: {0}")]
    AoiDefinitionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A point in page or window pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle in page pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub top_left: Point2,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top_left: Point2::new(x, y),
            width,
            height,
        }
    }

    /// Corner points clockwise from the top-left
    pub fn corners(&self) -> [Point2; 4] {
        let Point2 { x, y } = self.top_left;
        [
            Point2::new(x, y),
            Point2::new(x + self.width, y),
            Point2::new(x + self.width, y + self.height),
            Point2::new(x, y + self.height),
        ]
    }

    /// Offset of `point` relative to the top-left corner
    pub fn relative(&self, point: Point2) -> Point2 {
        point - self.top_left
    }

    /// True if `point` lies strictly inside the rectangle.
    ///
    /// Points on the boundary are outside.
    pub fn strictly_contains(&self, point: Point2) -> bool {
        let local = self.relative(point);
        0.0 < local.x && local.x < self.width && 0.0 < local.y && local.y < self.height
    }
}

/// Browser viewport (client area) size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raw gaze sample in normalized scene-camera space, as recorded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazePoint {
    pub x: f32,
    pub y: f32,
}

impl GazePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A gaze sample mapped onto a tracked surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGaze {
    /// Normalized surface x (0 = left edge)
    pub x: f64,
    /// Normalized surface y (0 = bottom edge, Y grows upward)
    pub y: f64,
    /// Whether the sample actually falls on the surface
    pub is_on_surface: bool,
}

impl SurfaceGaze {
    pub fn new(x: f64, y: f64, is_on_surface: bool) -> Self {
        Self { x, y, is_on_surface }
    }

    /// Window pixel coordinates, flipping Y so the origin is the top-left
    pub fn to_window(&self, viewport: ViewportSize) -> Point2 {
        let width = viewport.width as f64;
        let height = viewport.height as f64;
        Point2::new(self.x * width, height - self.y * height)
    }
}

/// Opaque handle of a surface registered with the surface tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}
