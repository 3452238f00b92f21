use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_TARGET: &str = "http://127.0.0.1:8000";
pub const DEFAULT_STATSD_BIND: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8125);
pub const DEFAULT_METRIC_PREFIX: &str = "piarch_token_service.requests";

/// Delays inserted by the scenario so the target's asynchronous metric
/// emission lands before the next probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioPacing {
    /// Pause after each of the single-request steps.
    pub step_delay: Duration,
    /// Pause after each request of the final burst step.
    pub burst_delay: Duration,
}

impl Default for ScenarioPacing {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(500),
            burst_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base URL of the service under test.
    pub target: String,
    pub statsd_bind: SocketAddr,
    pub metric_prefix: String,
    /// Per-probe timeout.
    pub timeout: Duration,
    pub pacing: ScenarioPacing,
    /// Wait between the collector becoming ready and the first probe.
    pub startup_delay: Duration,
    /// Upper bound on the post-scenario drain.
    pub drain: Duration,
    /// Drain ends early once the collector has been idle this long.
    pub drain_quiet: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            statsd_bind: DEFAULT_STATSD_BIND,
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
            timeout: Duration::from_secs(5),
            pacing: ScenarioPacing::default(),
            startup_delay: Duration::from_secs(1),
            drain: Duration::from_secs(2),
            drain_quiet: Duration::from_millis(250),
        }
    }
}
