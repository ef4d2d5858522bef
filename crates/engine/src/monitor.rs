use crate::aggregator::aggregate;
use crate::history::{history, HistoryReader, HistorySnapshot};
use crate::sampler::Sampler;
use pingwatch_core::{
    Message, ProbeTransport, Result, SamplerState, SamplingParams, Target, TargetReport,
    WatchError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Broadcast channel capacity for sampler events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Identifies one started sampler.  Stale once that sampler is stopped, even
/// if the same host is started again later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetHandle {
    id:     u64,
    target: Target,
}

impl TargetHandle {
    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Internal bookkeeping for a single monitored target.
struct ManagedTarget {
    id:      u64,
    params:  SamplingParams,
    history: HistoryReader,
    state:   watch::Receiver<SamplerState>,
    /// Child of the monitor's master token.
    cancel:  CancellationToken,
    /// Taken by whichever `stop` call gets there first.
    task:    Option<JoinHandle<()>>,
}

/// Registry of running samplers, one per target.
///
/// Each target gets its own task and its own history.  The monitor only ever
/// reads histories; samplers are their sole writers.
pub struct Monitor {
    targets:   RwLock<HashMap<Target, ManagedTarget>>,
    transport: Arc<dyn ProbeTransport>,
    events:    broadcast::Sender<Message>,
    /// Master cancellation token, cancelled on shutdown or drop.
    cancel:    CancellationToken,
    next_id:   AtomicU64,
}

impl Monitor {
    pub fn new(transport: Arc<dyn ProbeTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            targets: RwLock::new(HashMap::new()),
            transport,
            events,
            cancel: CancellationToken::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to sample, failure and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.events.subscribe()
    }

    /// Validate `host` and `params`, create the target's history and spawn
    /// its sampler.  Must be called from within a Tokio runtime.
    pub fn start(&self, host: &str, params: SamplingParams) -> Result<TargetHandle> {
        let target = Target::parse(host)?;
        params.validate()?;
        if self.cancel.is_cancelled() {
            return Err(WatchError::ShutDown);
        }

        let mut targets = self.write();
        if targets.contains_key(&target) {
            return Err(WatchError::DuplicateTarget(target.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (writer, reader) = history(params.capacity);
        let cancel = self.cancel.child_token();
        let sampler = Sampler::new(
            target.clone(),
            params,
            Arc::clone(&self.transport),
            writer,
            self.events.clone(),
            cancel.clone(),
        );
        let state = sampler.state();
        let task = tokio::spawn(sampler.run());

        info!(
            host = %target,
            capacity = params.capacity,
            window = params.window_cap(),
            "Added ping series"
        );

        targets.insert(
            target.clone(),
            ManagedTarget {
                id,
                params,
                history: reader,
                state,
                cancel,
                task: Some(task),
            },
        );

        Ok(TargetHandle { id, target })
    }

    /// Signal the sampler to stop and wait until it has fully exited.  The
    /// target's history is dropped afterwards.
    pub async fn stop(&self, handle: &TargetHandle) -> Result<()> {
        let (task, mut state) = {
            let mut targets = self.write();
            let entry = targets
                .get_mut(&handle.target)
                .filter(|e| e.id == handle.id)
                .ok_or_else(|| WatchError::UnknownTarget(handle.target.to_string()))?;
            entry.cancel.cancel();
            (entry.task.take(), entry.state.clone())
        };

        let Some(task) = task else {
            // Another caller is already stopping it; wait for the same outcome.
            let _ = state.wait_for(|s| *s == SamplerState::Stopped).await;
            return Ok(());
        };

        info!(host = %handle.target, "Stopping sampler");
        if let Err(e) = task.await {
            error!(host = %handle.target, "Sampler task ended abnormally: {e}");
        }

        {
            let mut targets = self.write();
            if targets.get(&handle.target).is_some_and(|e| e.id == handle.id) {
                targets.remove(&handle.target);
            }
        }

        let _ = self.events.send(Message::TargetStopped(handle.target.clone()));
        info!(host = %handle.target, "Sampler stopped");
        Ok(())
    }

    /// Stop by host rather than handle.
    pub async fn stop_target(&self, target: &Target) -> Result<()> {
        let handle = self
            .handle(target)
            .ok_or_else(|| WatchError::UnknownTarget(target.to_string()))?;
        self.stop(&handle).await
    }

    /// Currently registered targets, sorted.
    pub fn list_targets(&self) -> Vec<Target> {
        let mut out: Vec<Target> = self.read().keys().cloned().collect();
        out.sort();
        out
    }

    pub fn handle(&self, target: &Target) -> Option<TargetHandle> {
        self.read().get(target).map(|e| TargetHandle {
            id:     e.id,
            target: target.clone(),
        })
    }

    /// Lifecycle state of the sampler behind `handle`.  A handle whose sampler
    /// has been removed reports `Stopped`.
    pub fn state(&self, handle: &TargetHandle) -> SamplerState {
        let targets = self.read();
        let Some(entry) = targets.get(&handle.target).filter(|e| e.id == handle.id) else {
            return SamplerState::Stopped;
        };
        let state = *entry.state.borrow();
        match state {
            SamplerState::Created | SamplerState::Running if entry.cancel.is_cancelled() => {
                SamplerState::Stopping
            }
            other => other,
        }
    }

    /// Point-in-time copy of one target's history, for diagnostics.
    pub fn snapshot(&self, target: &Target) -> Option<HistorySnapshot> {
        self.read().get(target).map(|e| e.history.snapshot())
    }

    /// Aggregate every registered target.  Histories are snapshotted after
    /// the registry lock is released, so samplers are never waited on.
    pub fn reports(&self) -> Vec<TargetReport> {
        let readers: Vec<(Target, SamplingParams, HistoryReader)> = self
            .read()
            .iter()
            .map(|(t, e)| (t.clone(), e.params, e.history.clone()))
            .collect();

        let mut reports: Vec<TargetReport> = readers
            .into_iter()
            .map(|(target, params, reader)| aggregate(target, &reader.snapshot(), &params))
            .collect();
        reports.sort_by(|a, b| a.target.cmp(&b.target));
        reports
    }

    /// Stop every sampler and wait for all of them to exit.  No target can be
    /// started afterwards.
    pub async fn shutdown(&self) {
        info!("Shutting down monitor");
        self.cancel.cancel();

        let drained: Vec<(Target, JoinHandle<()>)> = {
            let mut targets = self.write();
            targets
                .iter_mut()
                .filter_map(|(t, e)| e.task.take().map(|task| (t.clone(), task)))
                .collect()
        };

        let results = futures::future::join_all(drained.into_iter().map(|(target, task)| async move {
            if let Err(e) = task.await {
                error!(host = %target, "Sampler task ended abnormally: {e}");
            }
            target
        }))
        .await;

        self.write().clear();
        for target in results {
            let _ = self.events.send(Message::TargetStopped(target));
        }

        info!("Monitor shut down complete");
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Target, ManagedTarget>> {
        self.targets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Target, ManagedTarget>> {
        self.targets.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("transport", &self.transport.name())
            .field("targets", &self.list_targets())
            .finish()
    }
}
