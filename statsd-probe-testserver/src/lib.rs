//! A stand-in for the token service: `GET /login` authenticates the `authorize`
//! header and reports one StatsD counter per outcome, plus `total` for every request.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

pub const PATH_LOGIN: &str = "/login";
/// Accepts the request and never answers.
pub const PATH_HANG: &str = "/hang";

pub const DEFAULT_PREFIX: &str = "piarch_token_service.requests";

pub const SKELETON_USER: &str = "testuser";
pub const SKELETON_PASS: &str = "testpass";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Counter {
    Total,
    Success,
    Failed,
    Unauthorized,
}

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    /// Where counter datagrams are sent.
    pub statsd_addr: SocketAddr,
    pub prefix: String,
    /// Counters the server counts internally but never emits.
    pub muted: Vec<Counter>,
}

impl TestServerConfig {
    pub fn new(statsd_addr: SocketAddr) -> Self {
        Self {
            statsd_addr,
            prefix: DEFAULT_PREFIX.to_string(),
            muted: Vec::new(),
        }
    }

    #[must_use]
    pub fn mute(mut self, counter: Counter) -> Self {
        self.muted.push(counter);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    success: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    unauthorized: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc(&self, counter: Counter) -> u64 {
        let cell = match counter {
            Counter::Total => &self.requests_total,
            Counter::Success => &self.success,
            Counter::Failed => &self.failed,
            Counter::Unauthorized => &self.unauthorized,
        };
        cell.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn unauthorized(&self) -> u64 {
        self.unauthorized.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    socket: Arc<UdpSocket>,
    config: Arc<TestServerConfig>,
}

impl AppState {
    async fn count(&self, counter: Counter) -> u64 {
        let n = self.stats.inc(counter);
        if self.config.muted.contains(&counter) {
            return n;
        }

        let line = format!("{}.{counter}:1|c", self.config.prefix);
        if let Err(err) = self
            .socket
            .send_to(line.as_bytes(), self.config.statsd_addr)
            .await
        {
            tracing::warn!(%err, %line, "failed to emit counter");
        }
        n
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Credentials<'a> {
    Missing,
    Malformed,
    Basic { user: &'a str, pass: &'a str },
}

fn parse_authorize(value: Option<&str>) -> Credentials<'_> {
    let Some(value) = value else {
        return Credentials::Missing;
    };

    let parts: Vec<&str> = value.split(' ').collect();
    let [scheme, user_pass] = parts.as_slice() else {
        return Credentials::Malformed;
    };
    if *scheme != "Basic" {
        return Credentials::Malformed;
    }

    let fields: Vec<&str> = user_pass.split(':').collect();
    match *fields.as_slice() {
        [user, pass] => Credentials::Basic { user, pass },
        _ => Credentials::Malformed,
    }
}

async fn handle_login(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Bytes) {
    state.count(Counter::Total).await;

    let authorize = match headers.get("authorize").map(|v| v.to_str()) {
        None => None,
        Some(Ok(v)) => Some(v),
        Some(Err(_)) => Some(""),
    };

    match parse_authorize(authorize) {
        Credentials::Missing => {
            state.count(Counter::Unauthorized).await;
            (StatusCode::UNAUTHORIZED, Bytes::new())
        }
        Credentials::Malformed => {
            state.count(Counter::Failed).await;
            (StatusCode::BAD_REQUEST, Bytes::from_static(b"bad authorize header"))
        }
        Credentials::Basic { user, pass } if user == SKELETON_USER && pass == SKELETON_PASS => {
            let n = state.count(Counter::Success).await;
            (StatusCode::OK, Bytes::from(format!("token.{user}.{n}")))
        }
        Credentials::Basic { .. } => {
            state.count(Counter::Failed).await;
            (StatusCode::FORBIDDEN, Bytes::from_static(b"invalid credentials"))
        }
    }
}

async fn handle_hang() -> StatusCode {
    std::future::pending::<()>().await;
    StatusCode::OK
}

pub async fn router(config: TestServerConfig, stats: TestServerStats) -> std::io::Result<Router> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let state = AppState {
        stats,
        socket: Arc::new(socket),
        config: Arc::new(config),
    };

    Ok(Router::new()
        .route(PATH_LOGIN, get(handle_login))
        .route(PATH_HANG, get(handle_hang))
        .with_state(state))
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start(statsd_addr: SocketAddr) -> std::io::Result<Self> {
        Self::start_with(TestServerConfig::new(statsd_addr)).await
    }

    pub async fn start_with(config: TestServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(config, stats.clone()).await?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Connections parked on `/hang` would hold a graceful shutdown open forever.
        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(Duration::from_secs(1), &mut task)
                .await
                .is_err()
        {
            task.abort();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_header_forms() {
        assert_eq!(parse_authorize(None), Credentials::Missing);
        assert_eq!(parse_authorize(Some("invalid_format")), Credentials::Malformed);
        assert_eq!(parse_authorize(Some("Bearer a:b")), Credentials::Malformed);
        assert_eq!(parse_authorize(Some("Basic a:b:c")), Credentials::Malformed);
        assert_eq!(parse_authorize(Some("Basic  a:b")), Credentials::Malformed);
        assert_eq!(
            parse_authorize(Some("Basic testuser:testpass")),
            Credentials::Basic {
                user: "testuser",
                pass: "testpass"
            }
        );
    }
}
