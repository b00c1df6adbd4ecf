//! Timestamp-ordered value series

use crate::types::{Result, WebAoiError};

/// Equal-length timestamps and values, ordered by timestamp
///
/// If the input timestamps are not already non-decreasing, both sequences
/// are stable-sorted by timestamp at construction. The pairing between a
/// timestamp and its value never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSeries<T> {
    timestamps: Vec<u64>,
    values: Vec<T>,
}

impl<T> Default for TimedSeries<T> {
    fn default() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> TimedSeries<T> {
    /// Build a series from parallel timestamp and value sequences
    ///
    /// # Errors
    /// `InputError` if the two sequences differ in length.
    pub fn new(timestamps: Vec<u64>, values: Vec<T>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(WebAoiError::InputError(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }

        let sorted = timestamps.windows(2).all(|pair| pair[0] <= pair[1]);
        if sorted {
            return Ok(Self { timestamps, values });
        }

        log::debug!("Sorting {} out-of-order entries by timestamp", timestamps.len());

        let mut paired: Vec<(u64, T)> = timestamps.into_iter().zip(values).collect();
        // sort_by_key is stable, equal timestamps keep their recorded order
        paired.sort_by_key(|(timestamp, _)| *timestamp);
        let (timestamps, values) = paired.into_iter().unzip();

        Ok(Self { timestamps, values })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.timestamps.last().copied()
    }

    /// Iterate `(timestamp, &value)` pairs in timestamp order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter())
    }
}

impl<T> IntoIterator for TimedSeries<T> {
    type Item = (u64, T);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<u64>, std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.timestamps.into_iter().zip(self.values)
    }
}
