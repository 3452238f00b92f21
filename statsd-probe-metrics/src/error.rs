#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing `:` separator in metric line `{0}`")]
    MissingSeparator(String),

    #[error("empty metric name in line `{0}`")]
    EmptyName(String),

    #[error("invalid counter value `{value}` for `{name}`")]
    InvalidValue { name: String, value: String },

    #[error("counter delta for `{name}` must be finite and non-negative (got {delta})")]
    OutOfRange { name: String, delta: f64 },
}
