use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, cfg: &statsd_probe_core::RunConfig);
    fn on_sample(&self) -> Option<statsd_probe_core::SampleFn>;
    fn on_step(&self) -> Option<statsd_probe_core::StepFn>;
    fn print_summary(&self, report: &statsd_probe_core::RunReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
