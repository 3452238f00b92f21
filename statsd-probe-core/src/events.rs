use std::sync::Arc;

use statsd_probe_metrics::MetricSample;

use crate::scenario::StepReport;

pub type SampleFn = Arc<dyn Fn(&MetricSample) + Send + Sync + 'static>;
pub type StepFn = Arc<dyn Fn(&StepReport) + Send + Sync + 'static>;

/// Observers invoked while a run is in progress.
#[derive(Clone, Default)]
pub struct RunEvents {
    /// Called from the collector task for every accepted counter sample.
    pub on_sample: Option<SampleFn>,
    /// Called from the control task after each probe completes.
    pub on_step: Option<StepFn>,
}

impl std::fmt::Debug for RunEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEvents")
            .field("on_sample", &self.on_sample.is_some())
            .field("on_step", &self.on_step.is_some())
            .finish()
    }
}
