use crate::{error::Result, state::Target};
use async_trait::async_trait;
use std::time::Duration;

/// The reachability check a sampler calls once per probe.
///
/// Implementations report `Ok(())` when the host answered within `timeout`
/// and any `Err` otherwise.  The engine does not tell error kinds apart:
/// timeout, unreachable and resolution failures all count as a lost probe.
///
/// Dropping the returned future must abandon the probe.
#[async_trait]
pub trait ProbeTransport: Send + Sync + std::fmt::Debug {
    /// Short identifier, e.g. `"ping"` or `"tcp:443"`.
    fn name(&self) -> &str;

    async fn probe(&self, target: &Target, timeout: Duration) -> Result<()>;
}
