use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut bind_addr: SocketAddr = "127.0.0.1:8000".parse()?;
    let mut statsd_addr: SocketAddr = "127.0.0.1:8125".parse()?;
    let mut prefix = statsd_probe_testserver::DEFAULT_PREFIX.to_string();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:8000")
                })?;
                bind_addr = addr.parse()?;
            }
            "--statsd" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--statsd requires an address, e.g. 127.0.0.1:8125")
                })?;
                statsd_addr = addr.parse()?;
            }
            "--prefix" => {
                prefix = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--prefix requires a metric prefix"))?;
            }
            "-h" | "--help" => {
                eprintln!(
                    "statsd-probe-testserver\n\nUSAGE:\n  statsd-probe-testserver [--bind 127.0.0.1:8000] [--statsd 127.0.0.1:8125] [--prefix NAME]\n\nOUTPUT:\n  Prints HTTP_URL=<url> and STATSD_ADDR=<host:port> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let mut config = statsd_probe_testserver::TestServerConfig::new(statsd_addr);
    config.prefix = prefix;
    let stats = statsd_probe_testserver::TestServerStats::default();
    let app = statsd_probe_testserver::router(config, stats).await?;

    tracing::info!(%addr, %statsd_addr, "test server listening");
    println!("HTTP_URL=http://{addr}");
    println!("STATSD_ADDR={statsd_addr}");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
    });

    serve.await?;
    Ok(())
}
