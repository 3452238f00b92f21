use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use statsd_probe_core::{MetricSample, RunConfig, RunReport, SampleFn, StepFn, StepReport};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, cfg: &RunConfig) {
        println!("target: {}", cfg.target);
        println!("statsd: {}", cfg.statsd_bind);
        println!("prefix: {}", cfg.metric_prefix);
        println!();
    }

    fn on_sample(&self) -> Option<SampleFn> {
        Some(Arc::new(|s: &MetricSample| {
            println!("  metric {} +{}", s.name, format_value(s.delta));
        }))
    }

    fn on_step(&self) -> Option<StepFn> {
        Some(Arc::new(|r: &StepReport| println!("{}", render_step(r))))
    }

    fn print_summary(&self, report: &RunReport) -> anyhow::Result<()> {
        print!("{}", render_summary(report));
        Ok(())
    }
}

pub(crate) fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

fn format_elapsed(d: Duration) -> String {
    if d >= Duration::from_secs(1) {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}

pub(crate) fn render_step(r: &StepReport) -> String {
    let head = format!("[{}] {} (expects {})", r.step, r.label, r.expects);
    let elapsed = format_elapsed(r.elapsed);

    match (&r.result.status, &r.result.error) {
        (Some(status), _) if r.is_success() => format!(
            "{head}: status {status}, token {} bytes, {elapsed}",
            r.result.body.len()
        ),
        (Some(status), _) => format!("{head}: status {status}, {elapsed}"),
        (None, Some(err)) => format!("{head}: error {} ({}), {elapsed}", err.kind, err.message),
        (None, None) => format!("{head}: no response, {elapsed}"),
    }
}

pub(crate) fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let v = &report.validation;

    out.push_str("\nresults\n");

    if report.metrics.is_empty() {
        out.push_str("  no metrics received\n");
        writeln!(
            &mut out,
            "  check that the service sends StatsD counters to {}",
            report.statsd_addr
        )
        .ok();
    } else {
        out.push_str("  metrics:\n");
        for (name, value) in &report.metrics {
            writeln!(&mut out, "    {name}: {}", format_value(*value)).ok();
        }
    }

    let c = &report.collector;
    writeln!(
        &mut out,
        "  collector: datagrams {} accepted {} ignored {} rejected {} (drain: {})",
        c.datagrams, c.accepted, c.ignored, c.rejected, report.settle
    )
    .ok();

    let failed_probes = report
        .steps
        .iter()
        .filter(|s| s.result.error.is_some())
        .count();
    writeln!(
        &mut out,
        "  probes: {} sent, {failed_probes} transport errors",
        report.steps.len()
    )
    .ok();

    if report.metrics.is_empty() {
        return out;
    }

    out.push('\n');
    if v.all_present() {
        out.push_str("all expected counters captured\n");
    } else {
        writeln!(&mut out, "warning: missing expected counters: {}", v.missing.join(", ")).ok();
    }

    out.push_str("counter check:\n");
    writeln!(&mut out, "  total: {}", format_value(v.total)).ok();
    writeln!(
        &mut out,
        "  success + failed + unauthorized: {} ({} + {} + {})",
        format_value(v.expected_total()),
        format_value(v.success),
        format_value(v.failed),
        format_value(v.unauthorized)
    )
    .ok();

    if v.consistent() {
        out.push_str("counters are consistent\n");
    } else {
        out.push_str("warning: counters do not add up\n");
    }

    out
}
