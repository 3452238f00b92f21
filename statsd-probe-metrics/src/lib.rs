#![forbid(unsafe_code)]

pub mod error;
pub mod store;
pub mod wire;

pub use error::DecodeError;
pub use store::{CollectorStats, CounterStore, MetricAggregate};
pub use wire::{LineOutcome, MetricSample, MetricType, parse_datagram, parse_line};
