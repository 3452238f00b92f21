//! StatsD line decoding.
//!
//! A line has the form `<name>:<value>|<type>[|<extra>...]`. Only counters (`c`)
//! produce samples; every other type is skipped without an error.

use std::str::FromStr as _;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum MetricType {
    #[strum(serialize = "c")]
    Counter,
    #[strum(serialize = "g")]
    Gauge,
    #[strum(serialize = "ms")]
    Timer,
    #[strum(serialize = "h")]
    Histogram,
    #[strum(serialize = "s")]
    Set,
    #[strum(serialize = "d")]
    Distribution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub delta: f64,
}

/// Result of decoding one line of a datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Sample(MetricSample),
    /// Not a counter line. Holds the decoded type when it was a known one.
    Ignored(Option<MetricType>),
    Rejected(DecodeError),
}

/// Decodes one line. `Ok(None)` means the line is not a counter: another type,
/// no type field at all, or free text. Only lines typed `c` can fail.
pub fn parse_line(line: &str) -> Result<Option<MetricSample>, DecodeError> {
    let mut fields = line.split('|');
    let head = fields.next().unwrap_or_default();
    if !matches!(fields.next().map(MetricType::from_str), Some(Ok(MetricType::Counter))) {
        return Ok(None);
    }

    let Some((name, value)) = head.split_once(':') else {
        return Err(DecodeError::MissingSeparator(line.to_string()));
    };

    if name.is_empty() {
        return Err(DecodeError::EmptyName(line.to_string()));
    }

    let delta: f64 = value.parse().map_err(|_| DecodeError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })?;

    if !delta.is_finite() || delta < 0.0 {
        return Err(DecodeError::OutOfRange {
            name: name.to_string(),
            delta,
        });
    }

    Ok(Some(MetricSample {
        name: name.to_string(),
        delta,
    }))
}

/// Decodes every non-blank line of a datagram.
pub fn parse_datagram(bytes: &[u8]) -> Vec<LineOutcome> {
    let text = String::from_utf8_lossy(bytes);
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| match parse_line(line) {
            Ok(Some(sample)) => LineOutcome::Sample(sample),
            Ok(None) => LineOutcome::Ignored(ignored_type(line)),
            Err(err) => LineOutcome::Rejected(err),
        })
        .collect()
}

fn ignored_type(line: &str) -> Option<MetricType> {
    let kind = line.split('|').nth(1)?;
    MetricType::from_str(kind).ok()
}
