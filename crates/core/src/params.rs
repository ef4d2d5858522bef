use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// How wide the trailing window behind each series point may grow.
///
/// In TOML: `window = "expanding"` or `window = { trailing = 60 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Window grows with the history and saturates at its capacity.
    #[default]
    Expanding,
    /// Window never exceeds a fixed number of samples.
    Trailing(NonZeroUsize),
}

impl WindowPolicy {
    /// Maximum window width for a history of `capacity` samples.
    pub fn cap(self, capacity: usize) -> usize {
        match self {
            Self::Expanding => capacity,
            Self::Trailing(n) => n.get(),
        }
    }
}

/// Everything fixed at sampler creation.  No runtime reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingParams {
    pub tick_interval: Duration,
    /// Probes per tick (K).  A tick succeeds only if all of them do.
    pub batch_size: usize,
    pub probe_timeout: Duration,
    /// History capacity (C).
    pub capacity: usize,
    pub window: WindowPolicy,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            batch_size: 5,
            probe_timeout: Duration::from_secs(1),
            capacity: 900,
            window: WindowPolicy::Expanding,
        }
    }
}

impl SamplingParams {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(WatchError::InvalidParameter("tick interval must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(WatchError::InvalidParameter("batch size must be > 0".into()));
        }
        if self.probe_timeout.is_zero() {
            return Err(WatchError::InvalidParameter("probe timeout must be > 0".into()));
        }
        if self.capacity == 0 {
            return Err(WatchError::InvalidParameter("history capacity must be > 0".into()));
        }
        Ok(())
    }

    /// Effective trailing window width.
    pub fn window_cap(&self) -> usize {
        self.window.cap(self.capacity)
    }
}
