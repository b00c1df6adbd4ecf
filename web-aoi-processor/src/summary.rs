//! Statistics collected during a processing run

use crate::types::{timestamp_from_ns, Timestamp};
use serde::Serialize;

/// Counters describing one processing run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingSummary {
    /// Video frames handled
    pub frames_processed: usize,
    /// Gaze samples released from the gaze track
    pub gaze_samples: usize,
    /// Gaze samples discarded by the trailing gaze policy
    pub trailing_gaze_dropped: usize,
    /// Rows written to `gazes.csv` files
    pub gaze_rows: usize,
    /// Rows written to `aoi-*.csv` files
    pub aoi_hits: usize,
    /// Events that changed tab or viewport state
    pub events_applied: usize,
    /// Events dropped as malformed
    pub events_dropped: usize,
    /// Well-formed events with an unrecognized name
    pub events_unknown: usize,
    pub surfaces_established: usize,
    pub surfaces_replaced: usize,
    /// Number of tabs seen (including back-filled ids)
    pub tabs: usize,
    pub first_gaze: Option<Timestamp>,
    pub last_gaze: Option<Timestamp>,
}

impl ProcessingSummary {
    pub(crate) fn record_gaze_timestamp(&mut self, timestamp_ns: u64) {
        let timestamp = timestamp_from_ns(timestamp_ns);
        self.first_gaze.get_or_insert(timestamp);
        self.last_gaze = Some(timestamp);
    }

    /// Fraction of gaze samples that produced a `gazes.csv` row
    pub fn attribution_rate(&self) -> f64 {
        if self.gaze_samples == 0 {
            return 0.0;
        }
        self.gaze_rows as f64 / self.gaze_samples as f64
    }
}
