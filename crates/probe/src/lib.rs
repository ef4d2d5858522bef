//! Concrete probe transports for the sampling engine.

pub mod ping;
pub mod tcp;

pub use ping::SystemPing;
pub use tcp::TcpConnect;

use pingwatch_config::TransportConfig;
use pingwatch_core::ProbeTransport;
use std::sync::Arc;

/// Build the transport selected in the config.
pub fn transport_from_config(config: TransportConfig) -> Arc<dyn ProbeTransport> {
    tracing::debug!(?config, "Selecting probe transport");
    match config {
        TransportConfig::Ping => Arc::new(SystemPing::new()),
        TransportConfig::Tcp { port } => Arc::new(TcpConnect::new(port)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_selected_transport() {
        assert_eq!(transport_from_config(TransportConfig::Ping).name(), "ping");
        assert_eq!(
            transport_from_config(TransportConfig::Tcp { port: 443 }).name(),
            "tcp:443"
        );
    }
}
