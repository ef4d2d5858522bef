//! Sampling-and-aggregation engine.
//!
//! - [`Sampler`]   : one task per target, one boolean sample per tick
//! - `history`     : bounded single-writer / multi-reader sample ring
//! - [`aggregator`]: windowed percentages recomputed on a fixed cadence
//! - [`Monitor`]   : start / stop / list targets
//! - [`PresentationSink`]: what consumes the results

pub mod aggregator;
pub mod history;
pub mod monitor;
pub mod sampler;
pub mod sink;

pub use aggregator::{aggregate, headline, spawn_aggregator, windowed_series};
pub use history::{history, HistoryReader, HistorySnapshot, HistoryWriter};
pub use monitor::{Monitor, TargetHandle};
pub use sampler::Sampler;
pub use sink::{dispatch, FailureLog, PresentationSink};
