use async_trait::async_trait;
use pingwatch_core::{ProbeTransport, Result, Target, WatchError};
use std::time::Duration;
use tokio::net::TcpStream;

/// Treats a completed TCP handshake as a successful probe.
///
/// Useful where ICMP is filtered.  Name resolution counts against the timeout.
#[derive(Debug, Clone)]
pub struct TcpConnect {
    port: u16,
    name: String,
}

impl TcpConnect {
    pub fn new(port: u16) -> Self {
        Self { port, name: format!("tcp:{port}") }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl ProbeTransport for TcpConnect {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, target: &Target, timeout: Duration) -> Result<()> {
        let connect = TcpStream::connect((target.host(), self.port));
        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(WatchError::Probe(format!("{target}:{}: {e}", self.port))),
            Err(_) => Err(WatchError::Probe(format!("{target}:{}: timed out", self.port))),
        }
    }
}
