use crate::cli::Cli;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(cli: Cli) -> Result<ExitCode, RunError> {
    let out = output::formatter(cli.output);
    let cfg = cli.run_config();

    out.print_header(&cfg);
    tracing::debug!(
        url = %cfg.target,
        statsd = %cfg.statsd_bind,
        prefix = %cfg.metric_prefix,
        "starting run"
    );

    let events = statsd_probe_core::RunEvents {
        on_sample: out.on_sample(),
        on_step: out.on_step(),
    };
    let report = statsd_probe_core::run(&cfg, events).await?;
    tracing::debug!(
        probes = report.steps.len(),
        metrics = report.metrics.len(),
        passed = report.validation.passed(),
        "run finished"
    );

    out.print_summary(&report).map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}
