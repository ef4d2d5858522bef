use pingwatch_core::{Result, SamplingParams, Target, WatchError, WindowPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Root configuration structure parsed from `pingwatch.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Sampling and aggregation settings shared by every target.
    pub engine: EngineConfig,
    /// Console output settings.
    pub output: OutputConfig,
    /// Hosts to monitor.
    pub targets: Vec<TargetConfig>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output: OutputConfig::default(),
            targets: vec![TargetConfig::new("8.8.8.8")],
        }
    }
}

impl WatchConfig {
    /// Resolve every target against the engine defaults, rejecting bad
    /// hosts, zero-valued parameters and duplicates.
    pub fn resolved_targets(&self) -> Result<Vec<(Target, SamplingParams)>> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.targets.len());

        for entry in &self.targets {
            let target = Target::parse(&entry.host)
                .map_err(|e| WatchError::Config(e.to_string()))?;
            if !seen.insert(target.clone()) {
                return Err(WatchError::Config(format!("target '{target}' listed twice")));
            }
            let params = entry.params(&self.engine);
            params
                .validate()
                .map_err(|e| WatchError::Config(format!("target '{target}': {e}")))?;
            out.push((target, params));
        }

        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(WatchError::Config("no targets configured".into()));
        }
        if self.engine.aggregate_interval_ms == 0 {
            return Err(WatchError::Config("aggregate_interval_ms must be > 0".into()));
        }
        if self.output.log_lines == 0 {
            return Err(WatchError::Config("output.log_lines must be > 0".into()));
        }
        self.resolved_targets().map(|_| ())
    }

    pub fn aggregate_interval(&self) -> Duration {
        Duration::from_millis(self.engine.aggregate_interval_ms)
    }
}

/// Engine-wide settings.  Every sampling field can be overridden per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spacing between sampler ticks.
    pub tick_interval_ms: u64,
    /// Probes per tick.
    pub batch_size: usize,
    /// Timeout applied to each individual probe.
    pub probe_timeout_ms: u64,
    /// Samples retained per target.
    pub capacity: usize,
    /// Aggregator cadence, independent of the sampler tick.
    pub aggregate_interval_ms: u64,
    pub window: WindowPolicy,
    pub transport: TransportConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let params = SamplingParams::default();
        Self {
            tick_interval_ms:      params.tick_interval.as_millis() as u64,
            batch_size:            params.batch_size,
            probe_timeout_ms:      params.probe_timeout.as_millis() as u64,
            capacity:              params.capacity,
            aggregate_interval_ms: 1_000,
            window:                params.window,
            transport:             TransportConfig::default(),
        }
    }
}

/// Which probe transport the samplers use.
///
/// In TOML: `transport = "ping"` or `transport = { tcp = { port = 443 } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportConfig {
    /// One-shot system `ping` (ICMP echo).
    #[default]
    Ping,
    /// TCP connect to the given port.
    Tcp { port: u16 },
}

/// Config block for a single monitored host; unset fields fall back to `EngineConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub probe_timeout_ms: Option<u64>,
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub window: Option<WindowPolicy>,
}

impl TargetConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            tick_interval_ms: None,
            batch_size: None,
            probe_timeout_ms: None,
            capacity: None,
            window: None,
        }
    }

    pub fn params(&self, engine: &EngineConfig) -> SamplingParams {
        SamplingParams {
            tick_interval: Duration::from_millis(
                self.tick_interval_ms.unwrap_or(engine.tick_interval_ms),
            ),
            batch_size:    self.batch_size.unwrap_or(engine.batch_size),
            probe_timeout: Duration::from_millis(
                self.probe_timeout_ms.unwrap_or(engine.probe_timeout_ms),
            ),
            capacity:      self.capacity.unwrap_or(engine.capacity),
            window:        self.window.unwrap_or(engine.window),
        }
    }
}

/// How the console renders reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable headline lines.
    #[default]
    Text,
    /// One JSON object per report per aggregation cycle.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Number of failure log lines kept in memory.
    pub log_lines: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format:    OutputFormat::Text,
            log_lines: 100,
        }
    }
}
