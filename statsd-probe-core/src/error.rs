use std::net::SocketAddr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind statsd collector on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("statsd collector task exited before it was ready")]
    CollectorNotReady,

    #[error("invalid target url: {0}")]
    InvalidTarget(#[source] statsd_probe_http::Error),

    #[error("service not reachable at {target}: {source}")]
    TargetUnreachable {
        target: String,
        #[source]
        source: statsd_probe_http::Error,
    },
}
