//! Terminal front end for `pingwatch`.
//!
//! Owns the main loop and wires together all background tasks:
//! - one sampler per configured target (via [`Monitor`])
//! - the aggregator (windowed percentages every cycle)
//! - config file watcher (live reload on change)
//! - Ctrl-C (graceful shutdown)

pub mod format;
pub mod reload;
pub mod sink;

pub use sink::ConsoleSink;

use pingwatch_config::{default_path, load as load_config, ConfigWatcher, WatchConfig};
use pingwatch_core::{Result, SamplingParams, Target, WatchError};
use pingwatch_engine::{dispatch, spawn_aggregator, Monitor, PresentationSink};
use pingwatch_probe::transport_from_config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Run until Ctrl-C.  `config_path` defaults to [`default_path`].
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(default_path);
    let mut config = load_config(&path)?;

    let transport = transport_from_config(config.engine.transport);
    let monitor = Arc::new(Monitor::new(transport));
    let mut events = monitor.subscribe();

    info!("Ping success monitor started");
    info!(
        "Monitoring interval: {}",
        format::format_span(std::time::Duration::from_millis(config.engine.tick_interval_ms))
    );

    let mut running = HashMap::new();
    apply(&monitor, &mut running, &config).await;
    let (reload_tx, reloader) = spawn_reloader(Arc::clone(&monitor), running);

    let cancel = CancellationToken::new();
    let mut reports = spawn_aggregator(
        Arc::clone(&monitor),
        config.aggregate_interval(),
        cancel.child_token(),
    );
    let (_watcher, mut changes) = ConfigWatcher::spawn(&path);
    let mut sink = ConsoleSink::stdout(&config.output);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                if let Err(e) = res {
                    error!("Cannot listen for Ctrl-C: {e}");
                }
                break;
            }
            Some(batch) = reports.recv() => {
                for report in &batch {
                    sink.on_report(report);
                }
            }
            msg = events.recv() => match msg {
                Ok(msg) => dispatch(&mut sink, &msg),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "Event consumer lagging"),
                Err(RecvError::Closed) => break,
            },
            Some(()) = changes.recv() => {
                if let Some(new) = reload_config(&path, &config) {
                    let _ = reload_tx.send(new.clone());
                    sink.reconfigure(&new.output);
                    config = new;
                }
            }
        }
    }

    cancel.cancel();
    drop(reload_tx);
    monitor.shutdown().await;
    if let Err(e) = reloader.await {
        error!("Config reload task failed: {e}");
    }
    info!("Ping success monitor stopped");
    Ok(())
}

/// Re-read the config.  Returns `None` (keeping the old config) when the new
/// file is invalid.  Settings that only take effect at start-up are reported.
fn reload_config(path: &Path, current: &WatchConfig) -> Option<WatchConfig> {
    info!("Config file changed; reloading");
    let new = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Ignoring invalid config: {e}");
            return None;
        }
    };

    if new.engine.transport != current.engine.transport {
        warn!("Probe transport changes take effect after a restart");
    }
    if new.engine.aggregate_interval_ms != current.engine.aggregate_interval_ms {
        warn!("Aggregate interval changes take effect after a restart");
    }
    Some(new)
}

/// Apply reloaded configs on a background task, one at a time and in the
/// order they were sent, so a slow stop never stalls the main loop.  The task
/// ends once the sender is dropped.
fn spawn_reloader(
    monitor: Arc<Monitor>,
    mut running: HashMap<Target, SamplingParams>,
) -> (mpsc::UnboundedSender<WatchConfig>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<WatchConfig>();
    let task = tokio::spawn(async move {
        while let Some(config) = rx.recv().await {
            apply(&monitor, &mut running, &config).await;
        }
    });
    (tx, task)
}

/// Bring the monitor's targets in line with `config`.
async fn apply(
    monitor: &Monitor,
    running: &mut HashMap<Target, SamplingParams>,
    config: &WatchConfig,
) {
    // `load` already validated the targets.
    let desired = match config.resolved_targets() {
        Ok(d) => d,
        Err(e) => {
            warn!("Ignoring invalid target list: {e}");
            return;
        }
    };

    let plan = reload::plan(running, &desired);

    for target in &plan.stop {
        if let Err(e) = monitor.stop_target(target).await {
            warn!(host = %target, "Cannot stop target: {e}");
        }
        running.remove(target);
    }

    for (target, params) in plan.start {
        match monitor.start(target.host(), params) {
            Ok(_) => {
                let ticks = u32::try_from(params.capacity).unwrap_or(u32::MAX);
                info!(
                    host = %target,
                    "Showing the last {}",
                    format::format_span(params.tick_interval.saturating_mul(ticks))
                );
                running.insert(target, params);
            }
            Err(WatchError::ShutDown) => debug!(host = %target, "Monitor shut down; not starting"),
            Err(e) => error!(host = %target, "Cannot start target: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pingwatch_config::TargetConfig;
    use pingwatch_core::ProbeTransport;
    use std::time::Duration;
    use tokio::time;

    /// Every probe answers after 300 ms, so a default batch takes 1.5 s.
    #[derive(Debug)]
    struct SlowNetwork;

    #[async_trait]
    impl ProbeTransport for SlowNetwork {
        fn name(&self) -> &str {
            "slow"
        }

        async fn probe(&self, _target: &Target, _timeout: Duration) -> Result<()> {
            time::sleep(Duration::from_millis(300)).await;
            Ok(())
        }
    }

    fn config_for(hosts: &[&str]) -> WatchConfig {
        WatchConfig {
            targets: hosts.iter().map(|h| TargetConfig::new(*h)).collect(),
            ..WatchConfig::default()
        }
    }

    fn hosts(monitor: &Monitor) -> Vec<String> {
        monitor.list_targets().iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn reloads_apply_in_background_and_in_order() {
        let monitor = Arc::new(Monitor::new(Arc::new(SlowNetwork)));
        let mut running = HashMap::new();
        apply(&monitor, &mut running, &config_for(&["8.8.8.8"])).await;
        let (tx, reloader) = spawn_reloader(Arc::clone(&monitor), running);

        time::sleep(Duration::from_millis(200)).await;
        tx.send(config_for(&["1.1.1.1"])).unwrap();
        tx.send(config_for(&["9.9.9.9"])).unwrap();

        // The stop is still waiting on the first tick; the caller is not.
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hosts(&monitor), vec!["8.8.8.8"]);

        drop(tx);
        reloader.await.unwrap();
        assert_eq!(hosts(&monitor), vec!["9.9.9.9"]);

        monitor.shutdown().await;
    }
}
