use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use statsd_probe_core::{
    DEFAULT_METRIC_PREFIX, DEFAULT_STATSD_BIND, DEFAULT_TARGET, RunConfig, ScenarioPacing,
};

fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim())
        .map_err(|err| format!("invalid duration '{input}' (expected e.g. 10s, 250ms, 1m): {err}"))
}

fn parse_target(input: &str) -> Result<String, String> {
    let s = input.trim();
    match s.split_once("://") {
        Some(("http" | "https", rest)) if !rest.is_empty() => Ok(s.to_string()),
        _ => Err(format!(
            "invalid target '{input}' (expected e.g. http://127.0.0.1:8000)"
        )),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and summary.
    HumanReadable,
    /// Emit one JSON object per event (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "statsd-probe",
    author,
    version,
    about = "Check that a service emits consistent StatsD counters for its login endpoint",
    long_about = "statsd-probe starts an in-process StatsD collector, drives a fixed sequence of GET /login requests against the target service and then checks the captured counters.\n\nThe target must be running before the probe starts; its StatsD client should point at --statsd-bind.\n\nValidation findings are reported on stdout and do not change the exit code.",
    after_help = "Examples:\n  statsd-probe\n  statsd-probe --target http://127.0.0.1:8000 --statsd-bind 127.0.0.1:8125\n  statsd-probe --step-delay 100ms --drain 1s --output json\n\nExit codes:\n  0    run completed\n  20   target not reachable\n  30   invalid arguments\n  40   runtime error (e.g. statsd port in use)\n  130  interrupted"
)]
pub struct Cli {
    /// Base URL of the service under test
    #[arg(long, env = "STATSD_PROBE_TARGET", default_value = DEFAULT_TARGET, value_parser = parse_target)]
    pub target: String,

    /// UDP address the mock StatsD collector listens on
    #[arg(long, env = "STATSD_PROBE_BIND", default_value_t = DEFAULT_STATSD_BIND)]
    pub statsd_bind: SocketAddr,

    /// Prefix of the request counters (`<prefix>.total`, `<prefix>.failed`, ...)
    #[arg(long, default_value = DEFAULT_METRIC_PREFIX)]
    pub metric_prefix: String,

    /// Per-request timeout (e.g. 5s, 250ms)
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub timeout: Duration,

    /// Pause after each single-request step
    #[arg(long, value_parser = parse_duration, default_value = "500ms")]
    pub step_delay: Duration,

    /// Pause after each request of the final burst step
    #[arg(long, value_parser = parse_duration, default_value = "200ms")]
    pub burst_delay: Duration,

    /// Wait between the collector starting and the first request
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub startup_delay: Duration,

    /// Upper bound on waiting for in-flight metrics after the last request
    #[arg(long, value_parser = parse_duration, default_value = "2s")]
    pub drain: Duration,

    /// Stop draining early once no metric arrived for this long
    #[arg(long, value_parser = parse_duration, default_value = "250ms")]
    pub drain_quiet: Duration,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            target: self.target.clone(),
            statsd_bind: self.statsd_bind,
            metric_prefix: self.metric_prefix.clone(),
            timeout: self.timeout,
            pacing: ScenarioPacing {
                step_delay: self.step_delay,
                burst_delay: self.burst_delay,
            },
            startup_delay: self.startup_delay,
            drain: self.drain,
            drain_quiet: self.drain_quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn parse_target_requires_http_scheme() {
        assert!(parse_target("http://127.0.0.1:8000").is_ok());
        assert!(parse_target("https://svc.internal").is_ok());
        assert!(parse_target("127.0.0.1:8000").is_err());
        assert!(parse_target("ftp://host").is_err());
        assert!(parse_target("http://").is_err());
    }

    #[test]
    fn defaults_match_the_run_config_defaults() {
        let cli = match Cli::try_parse_from(["statsd-probe"]) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };
        let cfg = cli.run_config();
        let defaults = RunConfig::default();

        assert_eq!(cfg.target, defaults.target);
        assert_eq!(cfg.statsd_bind, defaults.statsd_bind);
        assert_eq!(cfg.metric_prefix, defaults.metric_prefix);
        assert_eq!(cfg.timeout, defaults.timeout);
        assert_eq!(cfg.pacing, defaults.pacing);
        assert_eq!(cfg.startup_delay, defaults.startup_delay);
        assert_eq!(cfg.drain, defaults.drain);
        assert_eq!(cfg.drain_quiet, defaults.drain_quiet);
        assert!(matches!(cli.output, OutputFormat::HumanReadable));
    }

    #[test]
    fn cli_parses_overrides() {
        let parsed = Cli::try_parse_from([
            "statsd-probe",
            "--target",
            "http://10.0.0.5:9000",
            "--statsd-bind",
            "0.0.0.0:9125",
            "--metric-prefix",
            "svc.requests",
            "--step-delay",
            "50ms",
            "--drain",
            "3s",
            "--output",
            "json",
        ]);
        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let cfg = cli.run_config();
        assert_eq!(cfg.target, "http://10.0.0.5:9000");
        assert_eq!(cfg.statsd_bind, SocketAddr::from(([0, 0, 0, 0], 9125)));
        assert_eq!(cfg.metric_prefix, "svc.requests");
        assert_eq!(cfg.pacing.step_delay, Duration::from_millis(50));
        assert_eq!(cfg.pacing.burst_delay, Duration::from_millis(200));
        assert_eq!(cfg.drain, Duration::from_secs(3));
        assert!(matches!(cli.output, OutputFormat::Json));
    }
}
