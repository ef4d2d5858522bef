use crate::error::{Result, WatchError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Reason attached to every failed tick.  Probe-loss causes are not told apart.
pub const FAILURE_REASON: &str = "unreachable-or-lost";

/// A monitored host: an IP literal or an RFC 1123 hostname.
///
/// Immutable once constructed; a sampler holds its target for its whole life.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Validate `host` and wrap it.
    pub fn parse(host: &str) -> Result<Self> {
        let host = host.trim();
        if host.parse::<IpAddr>().is_ok() || is_valid_hostname(host) {
            Ok(Self(host.to_string()))
        } else {
            Err(WatchError::InvalidTarget(host.to_string()))
        }
    }

    pub fn host(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Outcome of one tick for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sample {
    Success,
    Failure,
}

impl Sample {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Lifecycle of a single sampler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// Success ratio over the entire retained history of one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Headline {
    /// Percentage in `[0, 100]`; `0.0` when there is no data.
    pub percent: f64,
    /// Number of samples the percentage was computed over.
    pub samples: usize,
}

impl Headline {
    /// The "no data" headline reported for an empty history.
    pub const EMPTY: Self = Self { percent: 0.0, samples: 0 };

    #[must_use]
    pub fn from_counts(successes: usize, samples: usize) -> Self {
        if samples == 0 {
            return Self::EMPTY;
        }
        Self {
            percent: 100.0 * successes as f64 / samples as f64,
            samples,
        }
    }

    pub fn has_data(&self) -> bool {
        self.samples > 0
    }

    /// One decimal with a trailing `.0` stripped, e.g. `"80%"` or `"66.7%"`.
    /// Returns `"--"` when there is no data yet.
    pub fn display(&self) -> String {
        if !self.has_data() {
            return "--".to_string();
        }
        let text = format!("{:.1}", self.percent);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        format!("{text}%")
    }
}

/// One point of a [`WindowedSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Position in the history snapshot (0 = oldest retained sample).
    pub index: usize,
    /// Trailing-window success percentage in `[0, 100]`.
    pub percent: f64,
}

impl SeriesPoint {
    /// Time offset of this point from the oldest retained sample.
    pub fn elapsed(&self, tick_interval: Duration) -> Duration {
        tick_interval.saturating_mul(u32::try_from(self.index).unwrap_or(u32::MAX))
    }
}

/// Per-position trailing-window percentages for one history snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WindowedSeries(Vec<SeriesPoint>);

impl WindowedSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|p| p.percent)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent point, if any.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.0.last()
    }
}

/// Everything the presentation layer receives for one target per aggregation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: Target,
    pub series: WindowedSeries,
    pub headline: Headline,
    /// Sampler tick, for converting series indices to elapsed time.
    pub tick_interval: Duration,
}

/// Emitted once per unsuccessful tick.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEvent {
    pub timestamp: DateTime<Local>,
    pub target: Target,
    pub reason: &'static str,
}

impl FailureEvent {
    pub fn now(target: Target) -> Self {
        Self {
            timestamp: Local::now(),
            target,
            reason: FAILURE_REASON,
        }
    }

    /// Console log line, e.g. `"[14:03:07] Ping 8.8.8.8: FAILURE"`.
    pub fn message(&self) -> String {
        format!(
            "[{}] Ping {}: FAILURE",
            self.timestamp.format("%H:%M:%S"),
            self.target
        )
    }
}
