//! Shared helpers for the integration tests.

use mock_service::{OrderService, OrderServiceConfig};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Order service with short delays, so tests are bound by request count rather than the
/// simulated payment time.
pub fn fast_service() -> OrderServiceConfig {
    OrderServiceConfig {
        payment_delay: Duration::from_millis(1),
        processing_delay: Duration::from_millis(1),
        workers: 4,
        queue_capacity: 4096,
        ..Default::default()
    }
}

pub async fn start_service(config: OrderServiceConfig) -> (String, OrderService) {
    let (addr, service) = mock_service::spawn("127.0.0.1:0".parse().unwrap(), config)
        .await
        .expect("bind mock order service");
    (format!("http://{addr}"), service)
}
