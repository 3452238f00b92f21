use std::net::SocketAddr;
use std::time::Duration;

use statsd_probe_http::{HttpClient, HttpRequest, HttpTransportErrorKind};
use statsd_probe_metrics::{CollectorStats, MetricAggregate};

use crate::collector::{Collector, SettleOutcome};
use crate::config::RunConfig;
use crate::events::RunEvents;
use crate::scenario::{LOGIN_PATH, Scenario, StepReport, run_scenario};
use crate::validate::{MetricNames, ValidationReport, validate};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub statsd_addr: SocketAddr,
    pub steps: Vec<StepReport>,
    pub metrics: MetricAggregate,
    pub collector: CollectorStats,
    pub settle: SettleOutcome,
    pub validation: ValidationReport,
}

/// Probes the login endpoint once. Any HTTP response, whatever its status, counts as reachable.
pub async fn check_target(client: &HttpClient, target: &str, timeout: Duration) -> Result<()> {
    let url = format!("{}{LOGIN_PATH}", target.trim_end_matches('/'));
    let req = HttpRequest::get_owned(url).with_timeout(timeout);

    match client.request(req).await {
        Ok(res) => {
            tracing::debug!(url = %target, status = res.status, "target reachable");
            Ok(())
        }
        Err(err)
            if matches!(
                err.transport_error_kind(),
                HttpTransportErrorKind::InvalidUrl | HttpTransportErrorKind::UnsupportedScheme
            ) =>
        {
            Err(Error::InvalidTarget(err))
        }
        Err(source) => Err(Error::TargetUnreachable {
            target: target.to_string(),
            source,
        }),
    }
}

/// Health check, collector start, login scenario, drain, validation.
pub async fn run(cfg: &RunConfig, events: RunEvents) -> Result<RunReport> {
    let client = HttpClient::default();
    check_target(&client, &cfg.target, cfg.timeout).await?;

    let mut collector = Collector::start_with(cfg.statsd_bind, events.on_sample.clone()).await?;
    let statsd_addr = collector.local_addr();

    if !cfg.startup_delay.is_zero() {
        tokio::time::sleep(cfg.startup_delay).await;
    }

    let scenario = Scenario::login(cfg.pacing);
    let steps = run_scenario(
        &client,
        &cfg.target,
        &scenario,
        cfg.timeout,
        events.on_step.as_ref(),
    )
    .await;

    let settle = collector.settle(cfg.drain_quiet, cfg.drain).await;
    tracing::debug!(%settle, "drain finished");

    let metrics = collector.snapshot();
    let stats = collector.stats();
    collector.stop().await;

    let validation = validate(&metrics, &MetricNames::with_prefix(&cfg.metric_prefix));
    if !validation.all_present() {
        tracing::warn!(missing = ?validation.missing, "expected counters missing");
    }
    if !validation.consistent() {
        tracing::warn!(
            total = validation.total,
            expected = validation.expected_total(),
            "counter totals do not add up"
        );
    }

    Ok(RunReport {
        statsd_addr,
        steps,
        metrics,
        collector: stats,
        settle,
        validation,
    })
}
