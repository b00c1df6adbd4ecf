//! Recording synchronizer
//!
//! The processor merges the three tracks of a recording in one forward pass.
//! For each video frame it:
//! 1. releases every gaze sample up to the frame timestamp, applying the
//!    events recorded up to each sample's timestamp before attributing it
//! 2. applies the remaining events up to the frame timestamp
//! 3. (re)registers the active tab's surface if its marker geometry changed
//! 4. decodes the frame and keeps it for projecting the next window of gaze
//!
//! After the last frame, whatever remains in the gaze and event tracks is
//! flushed according to the [`TrailingGazePolicy`].

use crate::config::{ProcessorConfig, TrailingGazePolicy};
use crate::events::{BrowserEvent, EventParser};
use crate::recording::Recording;
use crate::summary::ProcessingSummary;
use crate::tab::TabState;
use crate::timeline::{Horizon, TimedSeries, WindowedSource};
use crate::tracker::{FrameSource, SurfaceTracker};
use crate::types::{GazePoint, Result, ViewportSize, WebAoiError};
use std::path::{Path, PathBuf};

/// How far past the highest known tab id an event may refer to
///
/// Tab ids are assigned in observation order, so a larger jump means a
/// corrupt event line rather than a real tab.
pub const MAX_TAB_ID_GAP: usize = 64;

/// Active tab after applying `event`
///
/// Scrolling in a tab or switching to it makes it active. Any other event
/// referring to a tab only activates it when no tab is active yet.
pub fn next_active_tab(current: Option<usize>, event: &BrowserEvent) -> Option<usize> {
    match event {
        BrowserEvent::Scroll { tab_id, .. } | BrowserEvent::TabSwitched { tab_id } => Some(*tab_id),
        _ => current.or(event.tab_id()),
    }
}

/// Orchestrates one processing run over a loaded [`Recording`]
pub struct RecordingProcessor<T, V>
where
    T: SurfaceTracker,
    V: FrameSource<Frame = T::Frame>,
{
    config: ProcessorConfig,
    output_dir: PathBuf,
    tracker: T,
    frames: V,
    video_frames: TimedSeries<usize>,
    gaze: WindowedSource<GazePoint>,
    events: WindowedSource<String>,
    parser: EventParser,
    tabs: Vec<TabState>,
    active_tab: Option<usize>,
    viewport: ViewportSize,
    last_frame: Option<T::Frame>,
    summary: ProcessingSummary,
}

impl<T, V> RecordingProcessor<T, V>
where
    T: SurfaceTracker,
    V: FrameSource<Frame = T::Frame>,
{
    /// Prepare a run writing per-tab outputs below `output_dir`
    ///
    /// # Errors
    /// `InputError` if the frame source and the video timestamps disagree on
    /// the number of frames; `IoError` if the output directory cannot be
    /// created.
    pub fn new(
        recording: Recording,
        tracker: T,
        frames: V,
        output_dir: &Path,
        config: ProcessorConfig,
    ) -> Result<Self> {
        if frames.frame_count() != recording.video_frames.len() {
            return Err(WebAoiError::InputError(format!(
                "video has {} frames but {} frame timestamps",
                frames.frame_count(),
                recording.video_frames.len()
            )));
        }

        std::fs::create_dir_all(output_dir)?;

        Ok(Self {
            viewport: config.initial_viewport,
            config,
            output_dir: output_dir.to_path_buf(),
            tracker,
            frames,
            video_frames: recording.video_frames,
            gaze: WindowedSource::new(recording.gaze),
            events: WindowedSource::new(recording.events),
            parser: EventParser::new(),
            tabs: Vec::new(),
            active_tab: None,
            last_frame: None,
            summary: ProcessingSummary::default(),
        })
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tabs(&self) -> &[TabState] {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<usize> {
        self.active_tab
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Run the merge over the whole recording
    pub fn process(&mut self) -> Result<ProcessingSummary> {
        let video = std::mem::take(&mut self.video_frames);
        log::info!(
            "Processing {} frames into {:?}",
            video.len(),
            self.output_dir
        );

        for (frame_timestamp, frame_index) in video {
            self.advance(Horizon::At(frame_timestamp))?;
            self.process_frame(frame_timestamp, frame_index)?;
            self.summary.frames_processed += 1;
        }

        match self.config.trailing_gaze {
            TrailingGazePolicy::ReuseLastFrame => self.advance(Horizon::Unbounded)?,
            TrailingGazePolicy::Drop => {
                let dropped = self.gaze.until(Horizon::Unbounded).len();
                if dropped > 0 {
                    log::info!("Dropping {} gaze samples past the last frame", dropped);
                }
                self.summary.gaze_samples += dropped;
                self.summary.trailing_gaze_dropped += dropped;
                self.apply_events(Horizon::Unbounded)?;
            }
        }

        for tab in self.tabs.iter_mut() {
            tab.flush()?;
        }
        self.summary.tabs = self.tabs.len();

        log::info!(
            "Processing finished: {} gaze rows, {} AOI hits across {} tabs",
            self.summary.gaze_rows,
            self.summary.aoi_hits,
            self.summary.tabs
        );

        Ok(self.summary.clone())
    }

    /// Release gaze and events up to `horizon` in causal order
    pub fn advance(&mut self, horizon: Horizon) -> Result<()> {
        for (gaze_timestamp, gaze) in self.gaze.until(horizon) {
            self.apply_events(Horizon::At(gaze_timestamp))?;
            self.process_gaze(gaze_timestamp, gaze)?;
        }
        self.apply_events(horizon)
    }

    fn apply_events(&mut self, horizon: Horizon) -> Result<()> {
        for (timestamp, line) in self.events.until(horizon) {
            self.apply_event(timestamp, &line)?;
        }
        Ok(())
    }

    /// Parse one event line and apply it to tab or viewport state
    ///
    /// Malformed and unknown events are logged and skipped. Only output
    /// failures are returned as errors.
    pub fn apply_event(&mut self, timestamp: u64, line: &str) -> Result<()> {
        let event = match self.parser.parse(line) {
            Ok(Some(event)) => event,
            Ok(None) => {
                log::warn!("Skipping event at {} not matching grammar: {:?}", timestamp, line);
                self.summary.events_dropped += 1;
                return Ok(());
            }
            Err(e) => {
                log::warn!("Skipping event at {}: {}", timestamp, e);
                self.summary.events_dropped += 1;
                return Ok(());
            }
        };

        if let BrowserEvent::Unknown { name } = &event {
            log::debug!("Ignoring unknown event '{}' at {}", name, timestamp);
            self.summary.events_unknown += 1;
            return Ok(());
        }

        if let Some(tab_id) = event.tab_id() {
            if tab_id > self.tabs.len() + MAX_TAB_ID_GAP {
                let e = WebAoiError::EventParseError(format!(
                    "tab {} is far beyond the {} tabs seen so far",
                    tab_id,
                    self.tabs.len()
                ));
                log::warn!("Skipping event at {}: {}", timestamp, e);
                self.summary.events_dropped += 1;
                return Ok(());
            }
            self.ensure_tab(tab_id);
        }

        let active_tab = next_active_tab(self.active_tab, &event);
        if active_tab != self.active_tab {
            log::debug!("Active tab {:?} -> {:?} at {}", self.active_tab, active_tab, timestamp);
            self.active_tab = active_tab;
        }

        match event {
            BrowserEvent::Url { tab_id, url } => {
                log::debug!("Tab {} navigated to {}", tab_id, url);
                self.tabs[tab_id].add_history(url);
            }
            BrowserEvent::TabSwitched { .. } => {}
            BrowserEvent::Scroll { tab_id, x, y } => {
                self.tabs[tab_id].set_scroll_offset(x, y);
            }
            BrowserEvent::Resize(size) => {
                log::debug!("Viewport resized to {}", size);
                self.viewport = size;
            }
            BrowserEvent::Aoi {
                tab_id,
                name,
                bounds,
                ..
            } => {
                self.tabs[tab_id].set_aoi(&name, bounds);
            }
            BrowserEvent::Marker {
                tab_id,
                marker_id,
                bounds,
                ..
            } => {
                self.tabs[tab_id].set_marker_bounds(marker_id, bounds);
            }
            BrowserEvent::Unknown { .. } => {}
        }

        self.summary.events_applied += 1;
        Ok(())
    }

    /// Create tab states up to and including `tab_id`
    fn ensure_tab(&mut self, tab_id: usize) {
        while self.tabs.len() <= tab_id {
            let id = self.tabs.len();
            self.tabs.push(TabState::new(id, &self.output_dir));
        }
    }

    fn process_frame(&mut self, frame_timestamp: u64, frame_index: usize) -> Result<()> {
        let Some(active) = self.active_tab else {
            log::trace!("No active tab at frame {}", frame_timestamp);
            return Ok(());
        };

        let tab = &mut self.tabs[active];
        if tab.markers_dirty() {
            let surface = match tab.surface() {
                None => {
                    let surface = self.tracker.establish(tab.markers(), self.viewport)?;
                    self.summary.surfaces_established += 1;
                    log::debug!("Tab {} established {} at {}", active, surface, frame_timestamp);
                    surface
                }
                Some(previous) => {
                    let surface = self.tracker.replace(previous, tab.markers(), self.viewport)?;
                    self.summary.surfaces_replaced += 1;
                    log::debug!(
                        "Tab {} replaced {} with {} at {}",
                        active,
                        previous,
                        surface,
                        frame_timestamp
                    );
                    surface
                }
            };
            tab.set_surface(surface);
        }

        self.last_frame = Some(self.frames.decode(frame_index)?);
        Ok(())
    }

    fn process_gaze(&mut self, timestamp: u64, gaze: GazePoint) -> Result<()> {
        self.summary.gaze_samples += 1;
        self.summary.record_gaze_timestamp(timestamp);

        let (Some(active), Some(frame)) = (self.active_tab, self.last_frame.as_ref()) else {
            return Ok(());
        };

        let tab = &mut self.tabs[active];
        let Some(surface) = tab.surface() else {
            return Ok(());
        };

        let mapped = self.tracker.project(frame, &[gaze])?;
        let Some(surface_gazes) = mapped.get(&surface) else {
            log::trace!("Gaze at {} not mapped onto {}", timestamp, surface);
            return Ok(());
        };

        for surface_gaze in surface_gazes {
            let attribution = tab.process_gaze(timestamp, surface_gaze, self.viewport)?;
            if attribution.recorded {
                self.summary.gaze_rows += 1;
            }
            self.summary.aoi_hits += attribution.aoi_hits;
        }
        Ok(())
    }
}
