use async_trait::async_trait;
use pingwatch_core::{
    Message, ProbeTransport, Result, Sample, SamplerState, SamplingParams, Target, WatchError,
};
use pingwatch_engine::{spawn_aggregator, Monitor};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Answers every host except the ones listed as down or hung.
#[derive(Debug, Default)]
struct FakeNetwork {
    down: HashSet<String>,
    hung: HashSet<String>,
    slow: HashSet<String>,
}

impl FakeNetwork {
    fn with_down(hosts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            down: hosts.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        })
    }

    fn with_hung(hosts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            hung: hosts.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        })
    }

    /// Listed hosts answer after 300 ms.
    fn with_slow(hosts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            slow: hosts.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        })
    }
}

#[async_trait]
impl ProbeTransport for FakeNetwork {
    fn name(&self) -> &str {
        "fake"
    }

    async fn probe(&self, target: &Target, _timeout: Duration) -> Result<()> {
        if self.hung.contains(target.host()) {
            std::future::pending::<()>().await;
        }
        if self.slow.contains(target.host()) {
            time::sleep(Duration::from_millis(300)).await;
        }
        if self.down.contains(target.host()) {
            return Err(WatchError::Probe("unreachable".into()));
        }
        Ok(())
    }
}

fn params(capacity: usize) -> SamplingParams {
    SamplingParams { capacity, ..SamplingParams::default() }
}

#[tokio::test(start_paused = true)]
async fn start_list_stop() {
    let monitor = Monitor::new(FakeNetwork::with_down(&[]));

    let b = monitor.start("9.9.9.9", params(10)).unwrap();
    let a = monitor.start("1.1.1.1", params(10)).unwrap();
    let names: Vec<String> = monitor.list_targets().iter().map(|t| t.to_string()).collect();
    assert_eq!(names, vec!["1.1.1.1", "9.9.9.9"]);

    time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(monitor.state(&a), SamplerState::Running);

    monitor.stop(&a).await.unwrap();
    assert_eq!(monitor.state(&a), SamplerState::Stopped);
    assert_eq!(monitor.list_targets(), vec![b.target().clone()]);
    assert!(monitor.snapshot(a.target()).is_none());

    assert!(matches!(monitor.stop(&a).await, Err(WatchError::UnknownTarget(_))));
    monitor.stop(&b).await.unwrap();
    assert!(monitor.list_targets().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_reports_stopping_until_tick_lands() {
    let monitor = Arc::new(Monitor::new(FakeNetwork::with_slow(&["8.8.8.8"])));
    let h = monitor.start("8.8.8.8", params(10)).unwrap();
    assert!(matches!(
        monitor.state(&h),
        SamplerState::Created | SamplerState::Running
    ));

    // Five 300 ms probes: the first tick runs until t = 1.5 s.
    time::sleep(Duration::from_millis(400)).await;
    assert_eq!(monitor.state(&h), SamplerState::Running);

    let stopper = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        let h = h.clone();
        async move { monitor.stop(&h).await }
    });
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(monitor.state(&h), SamplerState::Stopping);
    assert_eq!(monitor.list_targets(), vec![h.target().clone()]);
    assert!(monitor.snapshot(h.target()).unwrap().is_empty());

    stopper.await.unwrap().unwrap();
    assert_eq!(monitor.state(&h), SamplerState::Stopped);
    assert!(monitor.list_targets().is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_reports_errors_synchronously() {
    let monitor = Monitor::new(FakeNetwork::with_down(&[]));

    assert!(matches!(
        monitor.start("not a host!", params(10)),
        Err(WatchError::InvalidTarget(_))
    ));
    assert!(matches!(
        monitor.start("8.8.8.8", SamplingParams { batch_size: 0, ..params(10) }),
        Err(WatchError::InvalidParameter(_))
    ));

    monitor.start("8.8.8.8", params(10)).unwrap();
    assert!(matches!(
        monitor.start("8.8.8.8", params(10)),
        Err(WatchError::DuplicateTarget(_))
    ));

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn restarted_target_gets_fresh_history_and_handle() {
    let monitor = Monitor::new(FakeNetwork::with_down(&[]));

    let first = monitor.start("8.8.8.8", params(10)).unwrap();
    time::sleep(Duration::from_millis(2_500)).await;
    monitor.stop(&first).await.unwrap();

    let second = monitor.start("8.8.8.8", params(10)).unwrap();
    assert_ne!(first, second);
    assert_eq!(monitor.state(&first), SamplerState::Stopped);

    time::sleep(Duration::from_millis(500)).await;
    assert_eq!(monitor.snapshot(second.target()).unwrap().len(), 1);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn hung_target_does_not_hold_up_others() {
    let monitor = Monitor::new(FakeNetwork::with_hung(&["192.0.2.1"]));
    let hung = monitor.start("192.0.2.1", params(10)).unwrap();
    let healthy = monitor.start("8.8.8.8", params(10)).unwrap();

    time::sleep(Duration::from_millis(3_500)).await;

    // Five one-second timeouts: the hung target's first tick is still running.
    assert_eq!(monitor.snapshot(hung.target()).unwrap().len(), 0);
    assert_eq!(monitor.snapshot(healthy.target()).unwrap().len(), 4);

    let reports = monitor.reports();
    assert_eq!(reports.len(), 2);
    let healthy_report = reports.iter().find(|r| &r.target == healthy.target()).unwrap();
    assert_eq!(healthy_report.headline.percent, 100.0);
    let hung_report = reports.iter().find(|r| &r.target == hung.target()).unwrap();
    assert!(hung_report.series.is_empty());
    assert!(!hung_report.headline.has_data());

    time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(
        monitor.snapshot(hung.target()).unwrap().as_slice(),
        &[Sample::Failure]
    );

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn one_failure_event_per_failed_tick() {
    let monitor = Monitor::new(FakeNetwork::with_down(&["10.0.0.1"]));
    let mut events = monitor.subscribe();
    let down = monitor.start("10.0.0.1", params(10)).unwrap();

    time::sleep(Duration::from_millis(2_500)).await;
    monitor.stop(&down).await.unwrap();

    let mut failures = 0;
    let mut samples = 0;
    let mut stopped = false;
    while let Ok(msg) = events.try_recv() {
        match msg {
            Message::TickFailed(ev) => {
                assert_eq!(ev.target.host(), "10.0.0.1");
                failures += 1;
            }
            Message::SampleRecorded { sample, .. } => {
                assert_eq!(sample, Sample::Failure);
                samples += 1;
            }
            Message::TargetStopped(_) => stopped = true,
            Message::TargetStarted(_) => {}
        }
    }
    assert_eq!(samples, 3);
    assert_eq!(failures, samples);
    assert!(stopped);
}

#[tokio::test(start_paused = true)]
async fn history_is_bounded_by_capacity() {
    let monitor = Monitor::new(FakeNetwork::with_down(&[]));
    let h = monitor.start("8.8.8.8", params(3)).unwrap();

    time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(monitor.snapshot(h.target()).unwrap().len(), 3);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_everything() {
    let monitor = Monitor::new(FakeNetwork::with_down(&[]));
    let a = monitor.start("8.8.8.8", params(10)).unwrap();
    let b = monitor.start("1.1.1.1", params(10)).unwrap();

    time::sleep(Duration::from_millis(1_500)).await;
    monitor.shutdown().await;

    assert!(monitor.list_targets().is_empty());
    assert_eq!(monitor.state(&a), SamplerState::Stopped);
    assert_eq!(monitor.state(&b), SamplerState::Stopped);
    assert!(matches!(
        monitor.start("9.9.9.9", params(10)),
        Err(WatchError::ShutDown)
    ));
}

#[tokio::test(start_paused = true)]
async fn aggregator_reports_on_its_own_cadence() {
    let monitor = Arc::new(Monitor::new(FakeNetwork::with_down(&[])));
    monitor.start("8.8.8.8", params(10)).unwrap();

    let cancel = CancellationToken::new();
    let mut rx = spawn_aggregator(Arc::clone(&monitor), Duration::from_millis(500), cancel.clone());

    let mut cycles = 0;
    let mut last = None;
    while cycles < 7 {
        let reports = rx.recv().await.unwrap();
        assert_eq!(reports.len(), 1);
        last = reports.into_iter().next();
        cycles += 1;
    }

    // Seven cycles at 0.5 s span three seconds: more cycles than sampler ticks.
    let report = last.unwrap();
    let samples = report.headline.samples;
    assert!((3..=4).contains(&samples), "samples = {samples}");
    assert_eq!(report.series.len(), samples);
    assert!(report.series.percentages().all(|p| p == 100.0));

    cancel.cancel();
    while rx.recv().await.is_some() {}
    monitor.shutdown().await;
}
