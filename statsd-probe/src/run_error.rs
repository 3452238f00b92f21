use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    TargetUnreachable(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::TargetUnreachable(_) => ExitCode::TargetUnreachable,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::TargetUnreachable(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<statsd_probe_core::Error> for RunError {
    fn from(err: statsd_probe_core::Error) -> Self {
        match err {
            statsd_probe_core::Error::TargetUnreachable { .. } => Self::TargetUnreachable(
                anyhow::Error::new(err)
                    .context("start the service under test first (see --target)"),
            ),
            statsd_probe_core::Error::InvalidTarget(_) => {
                Self::InvalidInput(anyhow::Error::new(err))
            }
            other => Self::RuntimeError(anyhow::Error::new(other)),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) | Self::TargetUnreachable(e) | Self::RuntimeError(e) => {
                write!(f, "{e:#}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
