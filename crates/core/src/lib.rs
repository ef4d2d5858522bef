pub mod error;
pub mod event;
pub mod params;
pub mod probe;
pub mod state;

pub use error::{Result, WatchError};
pub use event::Message;
pub use params::{SamplingParams, WindowPolicy};
pub use probe::ProbeTransport;
pub use state::{
    FailureEvent, Headline, Sample, SamplerState, SeriesPoint, Target, TargetReport,
    WindowedSeries,
};
