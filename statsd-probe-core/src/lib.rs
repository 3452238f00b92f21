#![forbid(unsafe_code)]

mod collector;
mod config;
mod error;
mod events;
mod run;
mod scenario;
mod validate;

pub use collector::{Collector, SettleOutcome};
pub use config::{
    DEFAULT_METRIC_PREFIX, DEFAULT_STATSD_BIND, DEFAULT_TARGET, RunConfig, ScenarioPacing,
};
pub use error::{Error, Result};
pub use events::{RunEvents, SampleFn, StepFn};
pub use run::{RunReport, check_target, run};
pub use scenario::{
    AUTH_HEADER, AuthPath, LOGIN_PATH, PRIVILEGED_PASS, PRIVILEGED_USER, Scenario, ScenarioStep,
    StepReport, run_scenario,
};
pub use validate::{MetricNames, ValidationReport, validate};

pub use statsd_probe_http::{HttpClient, HttpTransportErrorKind, ProbeFailure, ProbeResult};
pub use statsd_probe_metrics::{CollectorStats, MetricAggregate, MetricSample};
