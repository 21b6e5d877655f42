//! Walk a local order service through a rollout: phase 1 sends every order to the
//! synchronous endpoint, then the same virtual users are switched to phase 3 without
//! restarting.
use mock_service::OrderServiceConfig;
use orderload::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("orderload=info,mock_service=info")
        .init();

    let (addr, service) = mock_service::spawn(
        "127.0.0.1:0".parse()?,
        OrderServiceConfig {
            payment_delay: Duration::from_millis(50),
            processing_delay: Duration::from_millis(50),
            workers: 4,
            ..Default::default()
        },
    )
    .await?;
    let host = format!("http://{addr}");

    let transport = Arc::new(ReqwestTransport::new()?);
    let phase_one = BehaviorProfile::from_config(&ProfileConfig::for_phase(&host, Phase::One))?;
    let mut swarm = Swarm::new(phase_one, transport);

    swarm.set_users(20);
    let stats = swarm
        .run_for(Duration::from_secs(10), Duration::from_secs(2))
        .await;
    println!("{}: {stats}", Phase::One);

    swarm.reconfigure(BehaviorProfile::from_config(&ProfileConfig::for_phase(
        &host,
        Phase::Three,
    ))?);
    swarm.set_users(20);
    let stats = swarm
        .run_for(Duration::from_secs(10), Duration::from_secs(2))
        .await;
    println!("{}: {stats}", Phase::Three);

    println!("{:?}", service.counters());
    Ok(())
}
