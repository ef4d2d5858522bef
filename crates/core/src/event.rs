use crate::state::{FailureEvent, Sample, Target};

/// Events broadcast by the monitor to anything that subscribes.
///
/// Sources:
/// - Sampler tasks      → `SampleRecorded`, `TickFailed`
/// - Monitor lifecycle  → `TargetStarted`, `TargetStopped`
///
/// Aggregated percentages travel separately, on the aggregator's own channel.
#[derive(Debug, Clone)]
pub enum Message {
    /// A tick completed and its sample was appended to the target's history.
    SampleRecorded { target: Target, sample: Sample },
    /// A tick failed (at least one probe in the batch got no response).
    TickFailed(FailureEvent),
    /// A sampler entered the `Running` state.
    TargetStarted(Target),
    /// A sampler fully exited; its history is gone.
    TargetStopped(Target),
}
