use crate::history::HistorySnapshot;
use crate::monitor::Monitor;
use pingwatch_core::{Headline, Sample, SamplingParams, SeriesPoint, Target, TargetReport, WindowedSeries};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Trailing-window success percentage at every position of `samples`.
///
/// Point `i` averages the last `min(window_cap, i + 1)` samples ending at `i`.
/// Runs in O(n) via prefix sums.  A `window_cap` of 0 is treated as 1.
pub fn windowed_series(samples: &[Sample], window_cap: usize) -> WindowedSeries {
    let cap = window_cap.max(1);

    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0usize);
    for s in samples {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + usize::from(s.is_success()));
    }

    let points = (0..samples.len())
        .map(|i| {
            let w = cap.min(i + 1);
            let successes = prefix[i + 1] - prefix[i + 1 - w];
            SeriesPoint {
                index:   i,
                percent: 100.0 * successes as f64 / w as f64,
            }
        })
        .collect();

    WindowedSeries::new(points)
}

/// Success ratio over the whole snapshot.  Not windowed.
pub fn headline(snapshot: &HistorySnapshot) -> Headline {
    Headline::from_counts(snapshot.successes(), snapshot.len())
}

/// Build the full report for one target.  Total: defined for every snapshot.
pub fn aggregate(target: Target, snapshot: &HistorySnapshot, params: &SamplingParams) -> TargetReport {
    TargetReport {
        target,
        series: windowed_series(snapshot.as_slice(), params.window_cap()),
        headline: headline(snapshot),
        tick_interval: params.tick_interval,
    }
}

/// Spawn the aggregation task.  Every `interval` it snapshots every registered
/// target's history and forwards one batch of [`TargetReport`]s (sorted by
/// target) through the returned channel.
///
/// The task stops when `cancel` fires or the receiver is dropped.
pub fn spawn_aggregator(
    monitor: Arc<Monitor>,
    interval: Duration,
    cancel: CancellationToken,
) -> mpsc::Receiver<Vec<TargetReport>> {
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_ms = interval.as_millis() as u64, "Aggregator started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reports = monitor.reports();
            tracing::debug!(targets = reports.len(), "Aggregation cycle");

            if tx.send(reports).await.is_err() {
                break; // all receivers dropped
            }
        }

        tracing::info!("Aggregator stopped");
    });

    rx
}
