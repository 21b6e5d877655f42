use anyhow::Context;
use clap::Parser;
use orderload::config::parse_weights;
use orderload::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Run weighted-task virtual users against an order service")]
struct Cli {
    /// JSON configuration file. Flags override values from the file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the order service
    #[arg(long, env = "ORDERLOAD_HOST")]
    host: Option<String>,

    /// Rollout preset: 1 (sync only) or 3 (async only)
    #[arg(short, long)]
    phase: Option<Phase>,

    /// Explicit weight table, e.g. `sync=5,async=5`. Applied after `--phase`.
    #[arg(short, long, value_parser = parse_weights)]
    weights: Option<BTreeMap<String, u32>>,

    /// Minimum think-time in seconds
    #[arg(long)]
    wait_min: Option<f64>,

    /// Maximum think-time in seconds
    #[arg(long)]
    wait_max: Option<f64>,

    #[arg(short, long)]
    users: Option<usize>,

    #[arg(short, long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    report_interval: Option<Duration>,

    #[arg(long)]
    seed: Option<u64>,

    /// Per-request timeout
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    timeout: Duration,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<LoadConfig> {
        let mut config = match &self.config {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?
                .parse::<LoadConfig>()
                .with_context(|| format!("parsing {}", path.display()))?,
            None => LoadConfig::default(),
        };

        let profile = &mut config.profile;
        if let Some(host) = &self.host {
            profile.host = host.clone();
        }
        if let Some(phase) = self.phase {
            profile.weights = phase.weights();
            profile.endpoints = phase.endpoints();
        }
        if let Some(weights) = &self.weights {
            *profile = std::mem::take(profile).with_weights(weights.clone());
        }
        if let Some(min) = self.wait_min {
            profile.wait_range.0 = min;
        }
        if let Some(max) = self.wait_max {
            profile.wait_range.1 = max;
        }

        let run = &mut config.run;
        if let Some(users) = self.users {
            run.users = users;
        }
        if let Some(duration) = self.duration {
            run.duration = duration;
        }
        if let Some(interval) = self.report_interval {
            run.report_interval = interval;
        }
        if self.seed.is_some() {
            run.seed = self.seed;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orderload=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    info!(
        "Target {} with weights {:?}",
        config.profile.host, config.profile.weights
    );

    let transport = Arc::new(ReqwestTransport::with_timeout(cli.timeout)?);
    let stats = LoadTest::from_config(&config, transport)?.await;

    println!("{stats}");
    Ok(())
}
