use std::time::Duration;

/// Default target used when neither a config file nor `--host` is given.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:8081";

pub const SYNC_ACTION: &str = "sync";
pub const ASYNC_ACTION: &str = "async";

pub const SYNC_PATH: &str = "/orders/sync";
pub const ASYNC_PATH: &str = "/orders/async";
pub const HEALTH_PATH: &str = "/health";

/// Think-time between iterations: random 100-500ms.
pub const DEFAULT_WAIT_MIN: Duration = Duration::from_millis(100);
pub const DEFAULT_WAIT_MAX: Duration = Duration::from_millis(500);

/// The weight given to the primary action of a phase preset.
pub const PRIMARY_WEIGHT: u32 = 10;

pub const DEFAULT_CUSTOMER_MIN: u32 = 1;
pub const DEFAULT_CUSTOMER_MAX: u32 = 1000;

pub const DEFAULT_USERS: usize = 10;
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);
