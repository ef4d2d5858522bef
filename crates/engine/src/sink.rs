use pingwatch_core::{FailureEvent, Message, Sample, Target, TargetReport};
use std::collections::VecDeque;

/// Whatever displays the engine's output: a terminal, a chart, a tray icon.
///
/// Only `on_report` and `on_failure` are required; the rest default to no-ops.
pub trait PresentationSink: Send {
    /// Called once per target per aggregation cycle.
    fn on_report(&mut self, report: &TargetReport);

    /// Called once per failed tick.
    fn on_failure(&mut self, event: &FailureEvent);

    fn on_sample(&mut self, _target: &Target, _sample: Sample) {}

    fn on_target_started(&mut self, _target: &Target) {}

    fn on_target_stopped(&mut self, _target: &Target) {}
}

/// Route a monitor event to the matching sink callback.
pub fn dispatch(sink: &mut dyn PresentationSink, message: &Message) {
    match message {
        Message::SampleRecorded { target, sample } => sink.on_sample(target, *sample),
        Message::TickFailed(event) => sink.on_failure(event),
        Message::TargetStarted(target) => sink.on_target_started(target),
        Message::TargetStopped(target) => sink.on_target_stopped(target),
    }
}

/// The most recent failure log lines, oldest first.
#[derive(Debug, Clone)]
pub struct FailureLog {
    lines:    VecDeque<String>,
    capacity: usize,
}

impl FailureLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an event's log line, dropping the oldest line if full.
    pub fn push(&mut self, event: &FailureEvent) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(event.message());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
