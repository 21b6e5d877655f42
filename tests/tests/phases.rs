use orderload_tests::*;

use orderload::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

fn profile(host: &str, phase: Phase) -> BehaviorProfile {
    let mut config = ProfileConfig::for_phase(host, phase);
    config.wait_range = (0., 0.005);
    BehaviorProfile::from_config(&config).unwrap()
}

#[tokio::test]
#[ntest::timeout(60_000)]
async fn phase_one_only_hits_sync() -> anyhow::Result<()> {
    init();
    let (host, service) = start_service(fast_service()).await;
    let profile = profile(&host, Phase::One);
    let transport = ReqwestTransport::new()?;
    let recorder = Recorder::new();
    let mut rng = StdRng::seed_from_u64(1);

    for _ in 0..1_000 {
        profile
            .run_iteration(&mut rng, &transport, &recorder)
            .await?;
    }

    let counters = service.counters();
    assert_eq!(counters.sync, 1_000);
    assert_eq!(counters.async_accepted, 0);
    assert_eq!(recorder.collect().success, 1_000);
    Ok(())
}

#[tokio::test]
#[ntest::timeout(60_000)]
async fn phase_three_only_hits_async() -> anyhow::Result<()> {
    init();
    let (host, service) = start_service(fast_service()).await;
    let profile = profile(&host, Phase::Three);
    let transport = ReqwestTransport::new()?;
    let recorder = Recorder::new();
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..1_000 {
        let outcome = profile
            .run_iteration(&mut rng, &transport, &recorder)
            .await?;
        assert!(matches!(outcome, IterationOutcome::Dispatched { status: 202, .. }));
    }

    let counters = service.counters();
    assert_eq!(counters.async_accepted, 1_000);
    assert_eq!(counters.sync, 0);
    Ok(())
}

#[tokio::test]
#[ntest::timeout(60_000)]
async fn live_rollout() {
    init();
    let (host, service) = start_service(fast_service()).await;
    let transport = Arc::new(ReqwestTransport::new().unwrap());
    let mut swarm = Swarm::new(profile(&host, Phase::One), transport).with_seed(5);

    swarm.set_users(8);
    let phase_one = swarm
        .run_for(Duration::from_millis(500), Duration::from_millis(100))
        .await;
    let after_phase_one = service.counters();

    assert!(phase_one.success > 0);
    assert_eq!(phase_one.error, 0);
    // Requests cut off by the end of the run may or may not have reached the service.
    assert!(after_phase_one.sync >= phase_one.success);
    assert!(after_phase_one.sync <= phase_one.dispatched("sync"));
    assert_eq!(after_phase_one.async_accepted, 0);

    swarm.reconfigure(profile(&host, Phase::Three));
    swarm.set_users(8);
    let phase_three = swarm
        .run_for(Duration::from_millis(500), Duration::from_millis(100))
        .await;
    let after_phase_three = service.counters();

    assert!(phase_three.dispatched("async") > 0);
    assert_eq!(phase_three.dispatched("sync"), 0);
    assert!(after_phase_three.async_accepted >= phase_three.success);
}
