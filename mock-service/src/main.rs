use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::OrderServiceConfig;
use std::net::SocketAddr;
use std::num::NonZeroU64;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Local stand-in for the order API")]
struct Cli {
    #[arg(short, long, default_value = "0.0.0.0:8081")]
    addr: SocketAddr,

    /// Time a synchronous order holds the payment lock
    #[arg(long, default_value = "3s", value_parser = humantime::parse_duration)]
    payment_delay: Duration,

    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Time a worker spends on one queued order
    #[arg(long, default_value = "3s", value_parser = humantime::parse_duration)]
    processing_delay: Duration,

    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Fail every Nth order request with a 500
    #[arg(long)]
    fail_every: Option<NonZeroU64>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    let config = OrderServiceConfig {
        payment_delay: cli.payment_delay,
        workers: cli.workers,
        processing_delay: cli.processing_delay,
        queue_capacity: cli.queue_capacity,
        fail_every: cli.fail_every,
    };

    mock_service::run(cli.addr, config).await?;
    Ok(())
}
