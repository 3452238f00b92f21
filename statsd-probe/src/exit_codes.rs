#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The scenario ran to completion. Validation findings do not affect the exit code.
    Success = 0,

    /// The target service did not answer the startup health check.
    TargetUnreachable = 20,

    /// Invalid CLI input (bad flags, durations, addresses or target URL).
    InvalidInput = 30,

    /// Internal/runtime error (statsd bind failure, IO errors, output failures).
    RuntimeError = 40,

    /// Interrupted by Ctrl-C.
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
