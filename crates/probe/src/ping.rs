use async_trait::async_trait;
use pingwatch_core::{ProbeTransport, Result, Target, WatchError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Extra time granted to the `ping` process beyond its own wait limit
/// (process start-up, name resolution).
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// Sends one ICMP echo request by running the system `ping` binary.
///
/// Raw ICMP sockets need elevated privileges on most systems; the setuid /
/// capability-enabled system binary does not.  The child is killed if the
/// probe future is dropped.
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    pub fn new() -> Self {
        Self { program: "ping".to_string() }
    }

    /// Use a different executable (e.g. an absolute path).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for a single echo request with the platform's flag spelling.
fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);

    if cfg!(windows) {
        vec!["-n".into(), "1".into(), "-w".into(), millis.to_string(), host.into()]
    } else if cfg!(target_os = "macos") {
        // BSD ping: -W is in milliseconds.
        vec!["-c".into(), "1".into(), "-W".into(), millis.to_string(), host.into()]
    } else {
        // iputils: -W is whole seconds.
        let secs = timeout.as_secs_f64().ceil().max(1.0) as u64;
        vec![
            "-n".into(),
            "-c".into(),
            "1".into(),
            "-W".into(),
            secs.to_string(),
            host.into(),
        ]
    }
}

#[async_trait]
impl ProbeTransport for SystemPing {
    fn name(&self) -> &str {
        "ping"
    }

    async fn probe(&self, target: &Target, timeout: Duration) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(ping_args(target.host(), timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let status = cmd.status();

        match tokio::time::timeout(timeout + PROCESS_GRACE, status).await {
            Ok(Ok(s)) if s.success() => Ok(()),
            Ok(Ok(s)) => Err(WatchError::Probe(format!("{target}: ping exited with {s}"))),
            Ok(Err(e)) => Err(WatchError::Probe(format!("cannot run '{}': {e}", self.program))),
            Err(_) => Err(WatchError::Probe(format!("{target}: timed out"))),
        }
    }
}
