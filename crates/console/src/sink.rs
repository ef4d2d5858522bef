use pingwatch_config::{OutputConfig, OutputFormat};
use pingwatch_core::{FailureEvent, Target, TargetReport};
use pingwatch_engine::{FailureLog, PresentationSink};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// One line of JSON output.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum JsonLine<'a> {
    Report(&'a TargetReport),
    Failure(&'a FailureEvent),
}

/// Terminal presentation: headline lines (or JSON) plus a failure log.
///
/// In text mode a target's line is only reprinted when its headline text
/// changes, so a steady link stays quiet.
pub struct ConsoleSink<W: Write + Send> {
    out:       W,
    format:    OutputFormat,
    log:       FailureLog,
    last_text: HashMap<Target, String>,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(config: &OutputConfig) -> Self {
        Self::new(std::io::stdout(), config)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, config: &OutputConfig) -> Self {
        Self {
            out,
            format: config.format,
            log: FailureLog::new(config.log_lines),
            last_text: HashMap::new(),
        }
    }

    /// Apply reloaded output settings.  Existing log lines are kept when the
    /// size is unchanged.
    pub fn reconfigure(&mut self, config: &OutputConfig) {
        self.format = config.format;
        if config.log_lines != self.log.capacity() {
            self.log = FailureLog::new(config.log_lines);
        }
        self.last_text.clear();
    }

    pub fn failure_log(&self) -> &FailureLog {
        &self.log
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_json(&mut self, line: &JsonLine<'_>) {
        match serde_json::to_string(line) {
            Ok(json) => self.write_line(&json),
            Err(e) => tracing::warn!("Cannot serialize output line: {e}"),
        }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!("Cannot write output: {e}");
        }
    }
}

impl<W: Write + Send> PresentationSink for ConsoleSink<W> {
    fn on_report(&mut self, report: &TargetReport) {
        match self.format {
            OutputFormat::Json => self.write_json(&JsonLine::Report(report)),
            OutputFormat::Text => {
                let text = report.headline.display();
                if self.last_text.get(&report.target) == Some(&text) {
                    return;
                }
                let window = report
                    .series
                    .last()
                    .map(|p| format!("{:.1}%", p.percent))
                    .unwrap_or_else(|| "--".to_string());
                self.write_line(&format!(
                    "{:<24} {:>7}  window {:>7}  samples {}",
                    report.target.host(),
                    text,
                    window,
                    report.headline.samples
                ));
                self.last_text.insert(report.target.clone(), text);
            }
        }
    }

    fn on_failure(&mut self, event: &FailureEvent) {
        self.log.push(event);
        match self.format {
            OutputFormat::Json => self.write_json(&JsonLine::Failure(event)),
            OutputFormat::Text => {
                let line = event.message();
                self.write_line(&line);
            }
        }
    }

    fn on_target_started(&mut self, target: &Target) {
        tracing::info!(host = %target, "Monitoring started");
    }

    fn on_target_stopped(&mut self, target: &Target) {
        self.last_text.remove(target);
        tracing::info!(host = %target, "Monitoring stopped");
    }
}
