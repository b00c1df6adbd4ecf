//! Forward-only windowed reads over a [`TimedSeries`]

use super::series::TimedSeries;

/// Upper bound for a windowed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Release entries with timestamp <= the bound
    At(u64),
    /// Release everything that remains
    Unbounded,
}

impl Horizon {
    fn admits(&self, timestamp: u64) -> bool {
        match self {
            Horizon::At(bound) => timestamp <= *bound,
            Horizon::Unbounded => true,
        }
    }
}

/// Cursor that releases series entries up to a caller-supplied horizon
///
/// The first entry found past a horizon is held as a lookahead and released
/// by a later call whose horizon admits it. Across all calls every entry is
/// released exactly once, in timestamp order. Once the underlying series has
/// been exhausted the source stays exhausted.
#[derive(Debug)]
pub struct WindowedSource<T> {
    entries: std::iter::Zip<std::vec::IntoIter<u64>, std::vec::IntoIter<T>>,
    lookahead: Option<(u64, T)>,
    exhausted: bool,
}

impl<T> WindowedSource<T> {
    pub fn new(series: TimedSeries<T>) -> Self {
        Self {
            entries: series.into_iter(),
            lookahead: None,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Release all pending entries whose timestamp the horizon admits
    pub fn until(&mut self, horizon: Horizon) -> Vec<(u64, T)> {
        let mut released = Vec::new();

        if self.exhausted {
            return released;
        }

        if let Some((timestamp, _)) = &self.lookahead {
            if !horizon.admits(*timestamp) {
                return released;
            }
        }
        released.extend(self.lookahead.take());

        loop {
            match self.entries.next() {
                Some(entry) if horizon.admits(entry.0) => released.push(entry),
                Some(entry) => {
                    self.lookahead = Some(entry);
                    break;
                }
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(timestamps: &[u64]) -> WindowedSource<usize> {
        let values = (0..timestamps.len()).collect();
        WindowedSource::new(TimedSeries::new(timestamps.to_vec(), values).unwrap())
    }

    fn stamps(entries: Vec<(u64, usize)>) -> Vec<u64> {
        entries.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_releases_up_to_inclusive_horizon() {
        let mut src = source(&[10, 20, 30, 40]);
        assert_eq!(stamps(src.until(Horizon::At(20))), vec![10, 20]);
        assert_eq!(stamps(src.until(Horizon::At(35))), vec![30]);
        assert_eq!(stamps(src.until(Horizon::At(40))), vec![40]);
    }

    #[test]
    fn test_lookahead_held_when_past_horizon() {
        let mut src = source(&[10, 50]);
        assert_eq!(stamps(src.until(Horizon::At(20))), vec![10]);
        assert!(src.until(Horizon::At(30)).is_empty());
        assert!(src.until(Horizon::At(49)).is_empty());
        assert_eq!(stamps(src.until(Horizon::At(50))), vec![50]);
    }

    #[test]
    fn test_exhausted_source_stays_exhausted() {
        let mut src = source(&[1, 2]);
        assert_eq!(stamps(src.until(Horizon::At(5))), vec![1, 2]);
        assert!(src.is_exhausted());
        assert!(src.until(Horizon::Unbounded).is_empty());
        assert!(src.until(Horizon::At(u64::MAX)).is_empty());
    }

    #[test]
    fn test_unbounded_flushes_remaining() {
        let mut src = source(&[5, 15, 25]);
        assert_eq!(stamps(src.until(Horizon::At(5))), vec![5]);
        assert_eq!(stamps(src.until(Horizon::Unbounded)), vec![15, 25]);
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_empty_series_exhausts_immediately() {
        let mut src = source(&[]);
        assert!(src.until(Horizon::At(100)).is_empty());
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_values_stay_paired() {
        let mut src = WindowedSource::new(
            TimedSeries::new(vec![3, 1, 2], vec!["three", "one", "two"]).unwrap(),
        );
        assert_eq!(
            src.until(Horizon::Unbounded),
            vec![(1, "one"), (2, "two"), (3, "three")]
        );
    }
}
