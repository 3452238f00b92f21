//! In-process StatsD sink.
//!
//! The collector owns a UDP socket and a receive task. Each datagram is decoded
//! line by line and counter samples are folded into a [`CounterStore`]. Decode
//! failures are logged and counted; they never end the receive loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use statsd_probe_metrics::{
    CollectorStats, CounterStore, LineOutcome, MetricAggregate, parse_datagram,
};
use tokio::net::UdpSocket;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::events::SampleFn;
use crate::{Error, Result};

/// Largest payload a single UDP datagram can carry.
const MAX_DATAGRAM: usize = 65_535;

const RECV_BACKOFF_BASE: Duration = Duration::from_millis(10);
const RECV_BACKOFF_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SettleOutcome {
    /// No datagram arrived for the whole quiet window.
    Quiet,
    /// Traffic kept arriving until the upper bound elapsed.
    DeadlineReached,
    /// The collector was stopped while waiting.
    Stopped,
}

pub struct Collector {
    local_addr: SocketAddr,
    store: Arc<CounterStore>,
    activity: watch::Receiver<u64>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Collector {
    pub async fn start(bind: SocketAddr) -> Result<Self> {
        Self::start_with(bind, None).await
    }

    /// Binds `bind` and resolves once the receive task is running on the bound socket.
    pub async fn start_with(bind: SocketAddr, on_sample: Option<SampleFn>) -> Result<Self> {
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|source| Error::Bind { addr: bind, source })?;
        let local_addr = socket.local_addr()?;

        let store = Arc::new(CounterStore::new());
        let (activity_tx, activity) = watch::channel(0u64);
        let (ready_tx, ready_rx) = oneshot::channel::<()>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(receive_loop(
            socket,
            store.clone(),
            activity_tx,
            on_sample,
            ready_tx,
            shutdown_rx,
        ));

        ready_rx.await.map_err(|_| Error::CollectorNotReady)?;
        tracing::info!(%local_addr, "statsd collector listening");

        Ok(Self {
            local_addr,
            store,
            activity,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Independent copy of the current counter totals.
    pub fn snapshot(&self) -> MetricAggregate {
        self.store.snapshot()
    }

    pub fn stats(&self) -> CollectorStats {
        self.store.stats()
    }

    /// Waits until no datagram has arrived for `quiet`, bounded by `max`.
    pub async fn settle(&self, quiet: Duration, max: Duration) -> SettleOutcome {
        let mut activity = self.activity.clone();
        activity.borrow_and_update();

        let deadline = Instant::now() + max;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return SettleOutcome::DeadlineReached;
            }

            let window = quiet.min(deadline - now);
            match tokio::time::timeout(window, activity.changed()).await {
                Ok(Ok(())) => {
                    activity.borrow_and_update();
                }
                Ok(Err(_)) => return SettleOutcome::Stopped,
                Err(_) if window == quiet => return SettleOutcome::Quiet,
                Err(_) => return SettleOutcome::DeadlineReached,
            }
        }
    }

    /// Closes the socket and waits for the receive task. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
            tracing::info!(local_addr = %self.local_addr, "statsd collector stopped");
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    store: Arc<CounterStore>,
    activity: watch::Sender<u64>,
    on_sample: Option<SampleFn>,
    ready: oneshot::Sender<()>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut errors: u32 = 0;
    let _ = ready.send(());

    loop {
        if errors > 0 {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(recv_backoff(errors)) => {}
            }
        }

        tokio::select! {
            _ = &mut shutdown => break,
            res = socket.recv_from(&mut buf) => match res {
                Ok((n, peer)) => {
                    errors = 0;
                    handle_datagram(&buf[..n], peer, &store, on_sample.as_ref());
                    activity.send_modify(|seq| *seq = seq.wrapping_add(1));
                }
                Err(err) => {
                    errors = errors.saturating_add(1);
                    tracing::warn!(%err, consecutive = errors, "statsd receive failed");
                }
            },
        }
    }
}

/// Pause before the next receive after `consecutive_errors` failures in a row.
fn recv_backoff(consecutive_errors: u32) -> Duration {
    let shift = consecutive_errors.saturating_sub(1).min(7);
    (RECV_BACKOFF_BASE * (1u32 << shift)).min(RECV_BACKOFF_MAX)
}

fn handle_datagram(
    bytes: &[u8],
    peer: SocketAddr,
    store: &CounterStore,
    on_sample: Option<&SampleFn>,
) {
    let outcomes = parse_datagram(bytes);
    store.apply(&outcomes);

    for outcome in &outcomes {
        match outcome {
            LineOutcome::Sample(sample) => {
                tracing::debug!(%peer, name = %sample.name, delta = sample.delta, "counter received");
                if let Some(f) = on_sample {
                    f(sample);
                }
            }
            LineOutcome::Ignored(kind) => {
                tracing::trace!(%peer, kind = ?kind, "non-counter line ignored");
            }
            LineOutcome::Rejected(err) => {
                tracing::warn!(%peer, %err, "dropping malformed statsd line");
            }
        }
    }
}
