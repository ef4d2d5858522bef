use crate::history::HistoryWriter;
use pingwatch_core::{
    FailureEvent, Message, ProbeTransport, Sample, SamplerState, SamplingParams, Target,
};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-target probe loop.
///
/// Each tick sends `batch_size` probes one after another and records a single
/// [`Sample`]: success only if every probe in the batch answered.  Ticks are
/// spaced by sleeping whatever is left of the interval; an overrunning batch
/// is followed immediately by the next one.
pub struct Sampler {
    target:    Target,
    params:    SamplingParams,
    transport: Arc<dyn ProbeTransport>,
    history:   HistoryWriter,
    events:    broadcast::Sender<Message>,
    state:     Arc<watch::Sender<SamplerState>>,
    cancel:    CancellationToken,
}

impl Sampler {
    pub fn new(
        target: Target,
        params: SamplingParams,
        transport: Arc<dyn ProbeTransport>,
        history: HistoryWriter,
        events: broadcast::Sender<Message>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(SamplerState::Created);
        Self { target, params, transport, history, events, state: Arc::new(state), cancel }
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<SamplerState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires.  A tick already in flight is always finished
    /// and recorded before the loop exits.
    pub async fn run(mut self) {
        self.state.send_replace(SamplerState::Running);
        info!(
            host = %self.target,
            transport = self.transport.name(),
            interval_ms = self.params.tick_interval.as_millis() as u64,
            batch = self.params.batch_size,
            "Sampler running"
        );
        let _ = self.events.send(Message::TargetStarted(self.target.clone()));

        while !self.cancel.is_cancelled() {
            let started = Instant::now();
            let cancel = self.cancel.clone();
            let state = Arc::clone(&self.state);
            let host = self.target.clone();

            {
                let tick = self.tick();
                tokio::pin!(tick);
                tokio::select! {
                    _ = &mut tick => {}
                    _ = cancel.cancelled() => {
                        mark_stopping(&state);
                        debug!(host = %host, "Stop requested; finishing the batch in flight");
                        tick.await;
                        break;
                    }
                }
            }

            let remaining = self.params.tick_interval.saturating_sub(started.elapsed());
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    mark_stopping(&self.state);
                    break;
                }
                _ = time::sleep(remaining) => {}
            }
        }

        mark_stopping(&self.state);
        debug!(host = %self.target, "Sampler loop exited");
        self.state.send_replace(SamplerState::Stopped);
    }

    /// Run one batch, append its sample and announce it.
    pub async fn tick(&mut self) -> Sample {
        let answered = self.run_batch().await;
        let sample = Sample::from_success(answered == self.params.batch_size);

        self.history.append(sample);
        let _ = self.events.send(Message::SampleRecorded {
            target: self.target.clone(),
            sample,
        });

        if sample.is_success() {
            debug!(host = %self.target, "Tick succeeded");
        } else {
            warn!(
                host = %self.target,
                answered,
                batch = self.params.batch_size,
                "Tick failed"
            );
            let _ = self.events.send(Message::TickFailed(FailureEvent::now(self.target.clone())));
        }

        sample
    }

    /// Send the whole batch and count answers.  Every probe is sent even
    /// after a loss; errors of any kind count as no answer.
    async fn run_batch(&self) -> usize {
        let timeout = self.params.probe_timeout;
        let mut answered = 0;

        for n in 1..=self.params.batch_size {
            match time::timeout(timeout, self.transport.probe(&self.target, timeout)).await {
                Ok(Ok(())) => answered += 1,
                Ok(Err(e)) => debug!(host = %self.target, probe = n, "Probe lost: {e}"),
                Err(_) => debug!(host = %self.target, probe = n, "Probe timed out"),
            }
        }

        answered
    }
}

fn mark_stopping(state: &watch::Sender<SamplerState>) {
    state.send_if_modified(|s| {
        let changed = *s != SamplerState::Stopping;
        *s = SamplerState::Stopping;
        changed
    });
}
