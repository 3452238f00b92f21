use std::time::{Duration, Instant};

use statsd_probe_http::{HttpClient, ProbeResult};

use crate::config::ScenarioPacing;
use crate::events::StepFn;

pub const LOGIN_PATH: &str = "/login";
pub const AUTH_HEADER: &str = "authorize";

/// Credential pair the target accepts unconditionally.
pub const PRIVILEGED_USER: &str = "testuser";
pub const PRIVILEGED_PASS: &str = "testpass";

const BURST_REQUESTS: usize = 3;

/// Which authentication path a step is meant to exercise on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AuthPath {
    Unauthorized,
    Failed,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioStep {
    /// 1-based step number; the burst requests share one number.
    pub step: usize,
    pub label: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub expects: AuthPath,
    pub post_delay: Duration,
}

impl ScenarioStep {
    fn login(step: usize, label: &str, authorize: Option<String>, expects: AuthPath) -> Self {
        Self {
            step,
            label: label.to_string(),
            path: LOGIN_PATH.to_string(),
            headers: authorize
                .map(|v| vec![(AUTH_HEADER.to_string(), v)])
                .unwrap_or_default(),
            expects,
            post_delay: Duration::ZERO,
        }
    }

    fn then_wait(mut self, delay: Duration) -> Self {
        self.post_delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// The fixed login scenario: four single probes followed by a burst of three.
    pub fn login(pacing: ScenarioPacing) -> Self {
        let step_delay = pacing.step_delay;
        let mut steps = vec![
            ScenarioStep::login(1, "no authorization header", None, AuthPath::Unauthorized)
                .then_wait(step_delay),
            ScenarioStep::login(
                2,
                "malformed authorization header",
                Some("invalid_format".to_string()),
                AuthPath::Failed,
            )
            .then_wait(step_delay),
            ScenarioStep::login(
                3,
                "invalid credentials",
                Some(basic(PRIVILEGED_USER, "wrongpass")),
                AuthPath::Failed,
            )
            .then_wait(step_delay),
            ScenarioStep::login(
                4,
                "privileged credentials",
                Some(basic(PRIVILEGED_USER, PRIVILEGED_PASS)),
                AuthPath::Success,
            )
            .then_wait(step_delay),
        ];

        for i in 0..BURST_REQUESTS {
            steps.push(
                ScenarioStep::login(
                    5,
                    &format!("burst request {}", i + 1),
                    Some(basic(&format!("user{i}"), &format!("pass{i}"))),
                    AuthPath::Failed,
                )
                .then_wait(pacing.burst_delay),
            );
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    /// Number of requests that will be sent.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {user}:{pass}")
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: usize,
    pub label: String,
    pub expects: AuthPath,
    pub result: ProbeResult,
    pub elapsed: Duration,
}

impl StepReport {
    /// A 2xx response with a non-empty body.
    pub fn is_success(&self) -> bool {
        self.result.status.is_some_and(|s| (200..300).contains(&s)) && !self.result.body.is_empty()
    }
}

/// Runs every step in order. Transport failures are recorded and never stop the scenario.
pub async fn run_scenario(
    client: &HttpClient,
    base_url: &str,
    scenario: &Scenario,
    timeout: Duration,
    on_step: Option<&StepFn>,
) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(scenario.len());

    for step in scenario.steps() {
        let started = Instant::now();
        let result = client
            .probe(base_url, &step.path, &step.headers, timeout)
            .await;
        let elapsed = started.elapsed();

        match (&result.status, &result.error) {
            (Some(status), _) => {
                tracing::info!(step = step.step, label = %step.label, status, "probe completed");
            }
            (None, Some(err)) => {
                tracing::warn!(step = step.step, label = %step.label, kind = %err.kind, "probe failed: {}", err.message);
            }
            (None, None) => {}
        }

        let report = StepReport {
            step: step.step,
            label: step.label.clone(),
            expects: step.expects,
            result,
            elapsed,
        };
        if let Some(f) = on_step {
            f(&report);
        }
        reports.push(report);

        if !step.post_delay.is_zero() {
            tokio::time::sleep(step.post_delay).await;
        }
    }

    reports
}
