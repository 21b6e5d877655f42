use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Summary of a load test run.
#[derive(Clone, Debug, Default)]
pub struct RunStatistics {
    pub users: usize,
    pub elapsed: Duration,
    pub success: u64,
    pub error: u64,
    /// Iterations which selected a no-op action.
    pub skipped: u64,
    /// Iterations where every action weight was zero.
    pub no_eligible: u64,
    /// Requests sent, keyed by action name.
    pub dispatched: BTreeMap<String, u64>,
    pub requests_per_sec: f64,
    pub error_rate: f64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
}

impl RunStatistics {
    pub fn requests(&self) -> u64 {
        self.success + self.error
    }

    pub fn iterations(&self) -> u64 {
        self.requests() + self.skipped + self.no_eligible
    }

    pub fn dispatched(&self, action: &str) -> u64 {
        self.dispatched.get(action).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "users={}, elapsed={}, requests={}, errors={}, skipped={}, RPS={:.2}, ErrorRate={:.2}, p50={:?}, p90={:?}, p99={:?}",
            self.users,
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64)),
            self.requests(),
            self.error,
            self.skipped,
            self.requests_per_sec,
            self.error_rate,
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
        )?;
        for (action, count) in &self.dispatched {
            write!(f, ", {action}={count}")?;
        }
        Ok(())
    }
}
