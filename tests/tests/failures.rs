use orderload_tests::*;

use mock_service::OrderServiceConfig;
use orderload::prelude::*;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

fn fast_profile(host: &str) -> BehaviorProfile {
    let mut config = ProfileConfig::for_phase(host, Phase::Three);
    config.wait_range = (0.001, 0.002);
    BehaviorProfile::from_config(&config).unwrap()
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn server_errors_are_counted_not_fatal() {
    init();
    let (host, service) = start_service(OrderServiceConfig {
        fail_every: NonZeroU64::new(4),
        ..fast_service()
    })
    .await;

    let stats = LoadTest::new(fast_profile(&host), Arc::new(ReqwestTransport::new().unwrap()))
        .users(4)
        .duration(Duration::from_millis(500))
        .report_interval(Duration::from_millis(100))
        .await;

    assert!(stats.success > 0);
    assert!(stats.error > 0);
    assert!(service.counters().failed >= stats.error);
    assert!(stats.error_rate > 0.15 && stats.error_rate < 0.35, "{stats}");
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn unreachable_host() {
    init();
    // Grab a free port and release it again so nothing is listening there.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let transport = Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(1)).unwrap());
    let stats = LoadTest::new(fast_profile(&format!("http://{addr}")), transport)
        .users(2)
        .duration(Duration::from_millis(300))
        .report_interval(Duration::from_millis(100))
        .await;

    assert_eq!(stats.success, 0);
    assert!(stats.error >= 2, "users stopped after their first failure: {stats}");
    assert_eq!(stats.error_rate, 1.);
}
