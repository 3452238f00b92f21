use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context as _;
use statsd_probe_core::{
    Error, HttpClient, HttpTransportErrorKind, RunConfig, RunEvents, ScenarioPacing, StepFn,
    StepReport,
};
use statsd_probe_testserver::{Counter, PATH_HANG, TestServer, TestServerConfig};

const PREFIX: &str = "piarch_token_service.requests";

fn free_udp_addr() -> anyhow::Result<SocketAddr> {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0")?;
    Ok(socket.local_addr()?)
}

fn fast_config(target: &str, statsd_bind: SocketAddr) -> RunConfig {
    RunConfig {
        target: target.to_string(),
        statsd_bind,
        timeout: Duration::from_secs(2),
        pacing: ScenarioPacing {
            step_delay: Duration::from_millis(20),
            burst_delay: Duration::from_millis(10),
        },
        startup_delay: Duration::ZERO,
        drain: Duration::from_secs(2),
        drain_quiet: Duration::from_millis(150),
        ..RunConfig::default()
    }
}

fn metric(report: &statsd_probe_core::RunReport, suffix: &str) -> f64 {
    report
        .metrics
        .get(&format!("{PREFIX}.{suffix}"))
        .copied()
        .unwrap_or(0.0)
}

#[tokio::test]
async fn counters_add_up_after_the_login_scenario() -> anyhow::Result<()> {
    let statsd = free_udp_addr()?;
    let server = TestServer::start(statsd).await.context("start test server")?;
    let cfg = fast_config(server.base_url(), statsd);

    let report = statsd_probe_core::run(&cfg, RunEvents::default()).await?;
    let health_checks = server.stats().requests_total() - report.steps.len() as u64;
    server.shutdown().await;

    anyhow::ensure!(report.steps.len() == 7, "steps: {}", report.steps.len());
    anyhow::ensure!(health_checks == 1, "health checks: {health_checks}");
    anyhow::ensure!(
        report.validation.passed(),
        "validation failed: {:?}\nmetrics: {:?}",
        report.validation,
        report.metrics
    );

    // The health check lands before the collector is bound, so only scenario traffic counts.
    anyhow::ensure!(metric(&report, "total") == 7.0, "{:?}", report.metrics);
    anyhow::ensure!(metric(&report, "unauthorized") == 1.0);
    anyhow::ensure!(metric(&report, "failed") == 5.0);
    anyhow::ensure!(metric(&report, "success") == 1.0);
    anyhow::ensure!(report.collector.rejected == 0);

    Ok(())
}

#[tokio::test]
async fn step_observer_sees_every_probe_in_order() -> anyhow::Result<()> {
    let statsd = free_udp_addr()?;
    let server = TestServer::start(statsd).await.context("start test server")?;
    let cfg = fast_config(server.base_url(), statsd);

    let seen: Arc<Mutex<Vec<(usize, Option<u16>)>>> = Arc::new(Mutex::new(Vec::new()));
    let on_step: StepFn = {
        let seen = seen.clone();
        Arc::new(move |r: &StepReport| {
            seen.lock()
                .unwrap_or_else(|p| p.into_inner())
                .push((r.step, r.result.status));
        })
    };

    let report = statsd_probe_core::run(
        &cfg,
        RunEvents {
            on_sample: None,
            on_step: Some(on_step),
        },
    )
    .await?;
    server.shutdown().await;

    let seen = seen.lock().unwrap_or_else(|p| p.into_inner()).clone();
    anyhow::ensure!(
        seen == vec![
            (1, Some(401)),
            (2, Some(400)),
            (3, Some(403)),
            (4, Some(200)),
            (5, Some(403)),
            (5, Some(403)),
            (5, Some(403)),
        ],
        "unexpected step outcomes: {seen:?}"
    );
    anyhow::ensure!(report.steps[3].is_success());

    Ok(())
}

#[tokio::test]
async fn missing_counter_is_reported_not_fatal() -> anyhow::Result<()> {
    let statsd = free_udp_addr()?;
    let server = TestServer::start_with(TestServerConfig::new(statsd).mute(Counter::Unauthorized))
        .await
        .context("start test server")?;
    let cfg = fast_config(server.base_url(), statsd);

    let report = statsd_probe_core::run(&cfg, RunEvents::default()).await?;
    server.shutdown().await;

    let v = &report.validation;
    anyhow::ensure!(
        v.missing == vec![format!("{PREFIX}.unauthorized")],
        "missing: {:?}",
        v.missing
    );
    anyhow::ensure!(!v.consistent(), "expected a mismatch: {v:?}");
    anyhow::ensure!(v.total == 7.0 && v.expected_total() == 6.0, "{v:?}");

    Ok(())
}

#[tokio::test]
async fn unreachable_target_aborts_before_binding_the_collector() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let target = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let statsd = free_udp_addr()?;
    let cfg = fast_config(&target, statsd);

    let err = match statsd_probe_core::run(&cfg, RunEvents::default()).await {
        Ok(_) => anyhow::bail!("expected the run to fail"),
        Err(err) => err,
    };
    anyhow::ensure!(
        matches!(err, Error::TargetUnreachable { .. }),
        "unexpected error: {err:?}"
    );

    // Still free: the collector never started.
    std::net::UdpSocket::bind(statsd).context("statsd port should be unused")?;

    Ok(())
}

#[tokio::test]
async fn hanging_target_yields_a_timeout() -> anyhow::Result<()> {
    let statsd = free_udp_addr()?;
    let server = TestServer::start(statsd).await.context("start test server")?;

    let res = HttpClient::default()
        .probe(server.base_url(), PATH_HANG, &[], Duration::from_millis(200))
        .await;
    server.shutdown().await;

    anyhow::ensure!(
        res.error_kind() == Some(HttpTransportErrorKind::Timeout),
        "expected timeout, got {res:?}"
    );
    Ok(())
}
