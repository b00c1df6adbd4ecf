//! Timestamped streams and forward-only windowed reads
//!
//! A recording consists of independently clocked tracks. Each track is
//! loaded into a [`TimedSeries`] and consumed through a [`WindowedSource`],
//! which releases entries up to a moving horizon so that several tracks can
//! be merged in a single forward pass.

pub mod series;
pub mod window;

pub use series::TimedSeries;
pub use window::{Horizon, WindowedSource};
