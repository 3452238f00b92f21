use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use statsd_probe_core::{MetricSample, RunConfig, RunReport, SampleFn, StepFn, StepReport};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, cfg: &RunConfig) {
        emit_json_line(&JsonStartLine {
            kind: "start",
            target: &cfg.target,
            statsd_bind: cfg.statsd_bind.to_string(),
            metric_prefix: &cfg.metric_prefix,
        });
    }

    fn on_sample(&self) -> Option<SampleFn> {
        Some(Arc::new(|s: &MetricSample| {
            emit_json_line(&JsonSampleLine {
                kind: "sample",
                name: &s.name,
                delta: s.delta,
            });
        }))
    }

    fn on_step(&self) -> Option<StepFn> {
        Some(Arc::new(|r: &StepReport| {
            emit_json_line(&build_step_line(r));
        }))
    }

    fn print_summary(&self, report: &RunReport) -> anyhow::Result<()> {
        emit_json_line(&build_summary_line(report));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonStartLine<'a> {
    pub kind: &'static str,
    pub target: &'a str,
    pub statsd_bind: String,
    pub metric_prefix: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSampleLine<'a> {
    pub kind: &'static str,
    pub name: &'a str,
    pub delta: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonStepLine {
    pub kind: &'static str,
    pub step: usize,
    pub label: String,
    pub expects: String,
    pub status: Option<u16>,
    pub body_len: usize,
    pub error_kind: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: f64,
}

fn build_step_line(r: &StepReport) -> JsonStepLine {
    JsonStepLine {
        kind: "step",
        step: r.step,
        label: r.label.clone(),
        expects: r.expects.to_string(),
        status: r.result.status,
        body_len: r.result.body.len(),
        error_kind: r.result.error.as_ref().map(|e| e.kind.to_string()),
        error: r.result.error.as_ref().map(|e| e.message.clone()),
        elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCollectorStats {
    pub datagrams: u64,
    pub accepted: u64,
    pub ignored: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub statsd_addr: String,
    pub probes: usize,
    pub probe_errors: usize,
    pub metrics: BTreeMap<String, f64>,
    pub collector: JsonCollectorStats,
    pub settle: String,

    pub missing: Vec<String>,
    pub total: f64,
    pub success: f64,
    pub failed: f64,
    pub unauthorized: f64,
    pub expected_total: f64,
    pub consistent: bool,
    pub passed: bool,
}

fn build_summary_line(report: &RunReport) -> JsonSummaryLine {
    let v = &report.validation;
    let c = &report.collector;

    JsonSummaryLine {
        kind: "summary",
        statsd_addr: report.statsd_addr.to_string(),
        probes: report.steps.len(),
        probe_errors: report
            .steps
            .iter()
            .filter(|s| s.result.error.is_some())
            .count(),
        metrics: report.metrics.clone(),
        collector: JsonCollectorStats {
            datagrams: c.datagrams,
            accepted: c.accepted,
            ignored: c.ignored,
            rejected: c.rejected,
        },
        settle: report.settle.to_string(),
        missing: v.missing.clone(),
        total: v.total,
        success: v.success,
        failed: v.failed,
        unauthorized: v.unauthorized,
        expected_total: v.expected_total(),
        consistent: v.consistent(),
        passed: v.passed(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
