//! Per-browser-tab state
//!
//! A [`TabState`] accumulates everything the event stream tells us about one
//! tab (navigation history, marker geometry, scroll offset, AOIs) and owns
//! the CSV sinks that attributed gaze for that tab is written to. Sinks open
//! their files on the first row, so a tab costs no file handle until gaze is
//! attributed to it.

use crate::output::{self, CsvSink, AOI_COLUMNS, GAZE_COLUMNS};
use crate::types::{Point2, Rect, Result, SurfaceGaze, SurfaceHandle, ViewportSize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Marker id to its four corners (clockwise from top-left), in page pixels
pub type MarkerLayout = BTreeMap<u32, [Point2; 4]>;

/// Outcome of attributing one surface gaze sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GazeAttribution {
    /// A row was written to `gazes.csv`
    pub recorded: bool,
    /// Number of AOIs the sample fell inside
    pub aoi_hits: usize,
}

struct AoiTrack {
    bounds: Rect,
    sink: CsvSink,
}

/// Mutable state of one browser tab
pub struct TabState {
    id: usize,
    output_dir: PathBuf,
    history: Vec<String>,
    markers: MarkerLayout,
    markers_dirty: bool,
    surface: Option<SurfaceHandle>,
    scroll_offset: Point2,
    aois: BTreeMap<String, AoiTrack>,
    gaze_sink: CsvSink,
}

impl TabState {
    /// State for tab `id` writing below `output_root/tab-<id>`
    pub fn new(id: usize, output_root: &Path) -> Self {
        let output_dir = output_root.join(output::tab_dir_name(id));
        log::debug!("Created state for tab {} in {:?}", id, output_dir);

        let gaze_sink = CsvSink::new(output_dir.join("gazes.csv"), &GAZE_COLUMNS);

        Self {
            id,
            output_dir,
            history: Vec::new(),
            markers: MarkerLayout::new(),
            markers_dirty: false,
            surface: None,
            scroll_offset: Point2::default(),
            aois: BTreeMap::new(),
            gaze_sink,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn markers(&self) -> &MarkerLayout {
        &self.markers
    }

    pub fn markers_dirty(&self) -> bool {
        self.markers_dirty
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn scroll_offset(&self) -> Point2 {
        self.scroll_offset
    }

    pub fn aoi_bounds(&self, name: &str) -> Option<Rect> {
        self.aois.get(name).map(|track| track.bounds)
    }

    pub fn aoi_names(&self) -> impl Iterator<Item = &str> {
        self.aois.keys().map(String::as_str)
    }

    /// Output file of an AOI
    pub fn aoi_path(&self, name: &str) -> Option<&Path> {
        self.aois.get(name).map(|track| track.sink.path())
    }

    pub fn add_history(&mut self, url: impl Into<String>) {
        self.history.push(url.into());
    }

    /// Set a marker's corners from its bounding box and flag the geometry dirty
    pub fn set_marker_bounds(&mut self, marker_id: u32, bounds: Rect) {
        self.markers.insert(marker_id, bounds.corners());
        self.markers_dirty = true;
    }

    /// Set or replace an AOI rectangle
    ///
    /// A new AOI gets its own output file; names that sanitise to a file
    /// already used in this tab get a numeric suffix.
    pub fn set_aoi(&mut self, name: &str, bounds: Rect) {
        if let Some(track) = self.aois.get_mut(name) {
            track.bounds = bounds;
            return;
        }

        let mut duplicate = 0;
        let path = loop {
            let candidate = self.output_dir.join(output::aoi_file_name(name, duplicate));
            if !self.aois.values().any(|track| track.sink.path() == candidate) {
                break candidate;
            }
            duplicate += 1;
        };
        if duplicate > 0 {
            log::warn!(
                "Tab {} AOI '{}' written to {:?} to avoid a name clash",
                self.id,
                name,
                path
            );
        }

        let sink = CsvSink::new(path, &AOI_COLUMNS);
        self.aois.insert(name.to_string(), AoiTrack { bounds, sink });
    }

    pub fn set_scroll_offset(&mut self, x: f64, y: f64) {
        self.scroll_offset = Point2::new(x, y);
    }

    /// Record a newly established or replaced surface and clear the dirty flag
    pub fn set_surface(&mut self, surface: SurfaceHandle) {
        self.surface = Some(surface);
        self.markers_dirty = false;
    }

    /// Write a surface gaze sample to the gaze sink and every AOI it hits
    pub fn process_gaze(
        &mut self,
        timestamp: u64,
        gaze: &SurfaceGaze,
        viewport: ViewportSize,
    ) -> Result<GazeAttribution> {
        if !gaze.is_on_surface {
            return Ok(GazeAttribution::default());
        }

        let window = gaze.to_window(viewport);
        let page = window + self.scroll_offset;

        self.gaze_sink.write_row(
            timestamp,
            &[gaze.x, gaze.y, window.x, window.y, page.x, page.y],
        )?;

        let mut aoi_hits = 0;
        for (name, track) in self.aois.iter_mut() {
            if !track.bounds.strictly_contains(page) {
                continue;
            }

            let local = track.bounds.relative(page);
            log::trace!("Tab {} gaze at {} hit AOI '{}'", self.id, timestamp, name);
            track.sink.write_row(
                timestamp,
                &[
                    local.x / track.bounds.width,
                    local.y / track.bounds.height,
                    local.x,
                    local.y,
                ],
            )?;
            aoi_hits += 1;
        }

        Ok(GazeAttribution {
            recorded: true,
            aoi_hits,
        })
    }

    /// Write out every sink of this tab and release their file handles
    ///
    /// Files without rows are still created with their header.
    pub fn flush(&mut self) -> Result<()> {
        self.gaze_sink.finish()?;
        for track in self.aois.values_mut() {
            track.sink.finish()?;
        }
        Ok(())
    }

    pub fn gaze_rows(&self) -> u64 {
        self.gaze_sink.rows_written()
    }
}
