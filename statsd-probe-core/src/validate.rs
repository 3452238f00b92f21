use statsd_probe_metrics::MetricAggregate;

const TOLERANCE: f64 = 1e-9;

/// Fully qualified counter names under a common prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    pub total: String,
    pub success: String,
    pub failed: String,
    pub unauthorized: String,
}

impl MetricNames {
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('.');
        let name = |suffix: &str| {
            if prefix.is_empty() {
                suffix.to_string()
            } else {
                format!("{prefix}.{suffix}")
            }
        };

        Self {
            total: name("total"),
            success: name("success"),
            failed: name("failed"),
            unauthorized: name("unauthorized"),
        }
    }

    /// Names that must be present after the login scenario.
    pub fn required(&self) -> [&str; 3] {
        [
            self.total.as_str(),
            self.unauthorized.as_str(),
            self.failed.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Nothing at all was captured.
    pub empty: bool,
    pub missing: Vec<String>,
    pub total: f64,
    pub success: f64,
    pub failed: f64,
    pub unauthorized: f64,
}

impl ValidationReport {
    pub fn expected_total(&self) -> f64 {
        self.success + self.failed + self.unauthorized
    }

    /// `total == success + failed + unauthorized`.
    pub fn consistent(&self) -> bool {
        (self.total - self.expected_total()).abs() <= TOLERANCE
    }

    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn passed(&self) -> bool {
        !self.empty && self.all_present() && self.consistent()
    }
}

/// Checks presence of the required counters and the additive identity. Absent terms count as 0.
pub fn validate(snapshot: &MetricAggregate, names: &MetricNames) -> ValidationReport {
    let value = |name: &str| snapshot.get(name).copied().unwrap_or(0.0);

    let missing = names
        .required()
        .into_iter()
        .filter(|n| !snapshot.contains_key(*n))
        .map(str::to_string)
        .collect();

    ValidationReport {
        empty: snapshot.is_empty(),
        missing,
        total: value(&names.total),
        success: value(&names.success),
        failed: value(&names.failed),
        unauthorized: value(&names.unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> MetricNames {
        MetricNames::with_prefix("svc.requests")
    }

    fn aggregate(entries: &[(&str, f64)]) -> MetricAggregate {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect()
    }

    #[test]
    fn prefix_is_joined_with_a_dot() {
        let n = MetricNames::with_prefix("svc.requests.");
        assert_eq!(n.total, "svc.requests.total");
        assert_eq!(MetricNames::with_prefix("").failed, "failed");
    }

    #[test]
    fn consistent_complete_snapshot_passes() {
        let snap = aggregate(&[
            ("svc.requests.total", 7.0),
            ("svc.requests.success", 1.0),
            ("svc.requests.failed", 5.0),
            ("svc.requests.unauthorized", 1.0),
        ]);
        let report = validate(&snap, &names());

        assert!(report.all_present());
        assert!(report.consistent());
        assert!(report.passed());
        assert_eq!(report.expected_total(), 7.0);
    }

    #[test]
    fn missing_keys_are_reported_separately_from_the_identity() {
        let snap = aggregate(&[("svc.requests.total", 2.0), ("svc.requests.failed", 2.0)]);
        let report = validate(&snap, &names());

        assert_eq!(report.missing, vec!["svc.requests.unauthorized".to_string()]);
        assert!(report.consistent());
        assert!(!report.passed());
    }

    #[test]
    fn success_is_optional_and_defaults_to_zero() {
        let snap = aggregate(&[
            ("svc.requests.total", 3.0),
            ("svc.requests.failed", 2.0),
            ("svc.requests.unauthorized", 1.0),
        ]);
        let report = validate(&snap, &names());
        assert!(report.passed());
        assert_eq!(report.success, 0.0);
    }

    #[test]
    fn mismatched_totals_are_inconsistent() {
        let snap = aggregate(&[
            ("svc.requests.total", 8.0),
            ("svc.requests.success", 1.0),
            ("svc.requests.failed", 5.0),
            ("svc.requests.unauthorized", 1.0),
        ]);
        let report = validate(&snap, &names());
        assert!(report.all_present());
        assert!(!report.consistent());
    }

    #[test]
    fn empty_snapshot_lists_everything_missing() {
        let report = validate(&MetricAggregate::new(), &names());
        assert!(report.empty);
        assert_eq!(report.missing.len(), 3);
        assert!(report.consistent());
        assert!(!report.passed());
    }

    #[test]
    fn fractional_deltas_within_tolerance_are_consistent() {
        let snap = aggregate(&[
            ("svc.requests.total", 0.3),
            ("svc.requests.success", 0.1),
            ("svc.requests.failed", 0.2),
            ("svc.requests.unauthorized", 0.0),
        ]);
        assert!(validate(&snap, &names()).consistent());
    }
}
