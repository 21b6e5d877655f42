use crate::recorder::ProvisionalData;
use orderload_core::RunStatistics;
use pdatastructs::tdigest::{TDigest, K1};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Aggregated outcomes over some window of a run.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub success: u64,
    pub error: u64,
    pub skipped: u64,
    pub no_eligible: u64,
    pub dispatched: BTreeMap<String, u64>,
    pub elapsed: Duration,
    latency: TDigest<K1>,
    latency_count: usize,
}

impl Measurement {
    pub fn new(elapsed: Duration) -> Self {
        Self {
            success: 0,
            error: 0,
            skipped: 0,
            no_eligible: 0,
            dispatched: BTreeMap::new(),
            elapsed,
            latency: default_tdigest(),
            latency_count: 0,
        }
    }

    pub fn from_data(data: &ProvisionalData, elapsed: Duration) -> Self {
        let mut measurement = Self::new(elapsed);
        measurement.add(data);
        measurement
    }

    pub fn add(&mut self, data: &ProvisionalData) {
        self.success += data.success;
        self.error += data.error;
        self.skipped += data.skipped;
        self.no_eligible += data.no_eligible;
        for (action, count) in &data.dispatched {
            *self.dispatched.entry(action.clone()).or_default() += count;
        }
        self.populate_latencies(&data.latency);
    }

    pub fn populate_latencies(&mut self, dur: &[Duration]) {
        for latency in dur {
            self.latency.insert(latency.as_secs_f64());
        }
        self.latency_count += dur.len();
    }

    pub fn requests(&self) -> u64 {
        self.success + self.error
    }

    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0. {
            self.requests() as f64 / secs
        } else {
            0.
        }
    }

    pub fn error_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.,
            requests => self.error as f64 / requests as f64,
        }
    }

    pub fn latency(&self, quantile: f64) -> Duration {
        if self.latency_count == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);

        // TDigest can hand back NaN for tiny sample counts.
        let secs = if secs.is_finite() {
            secs.max(0.)
        } else {
            error!("NaN latency calculation over {} samples.", self.latency_count);
            0.
        };

        Duration::from_secs_f64(secs)
    }

    pub fn statistics(&self, users: usize) -> RunStatistics {
        RunStatistics {
            users,
            elapsed: self.elapsed,
            success: self.success,
            error: self.error,
            skipped: self.skipped,
            no_eligible: self.no_eligible,
            dispatched: self.dispatched.clone(),
            requests_per_sec: self.requests_per_sec(),
            error_rate: self.error_rate(),
            latency_p50: self.latency(0.5),
            latency_p90: self.latency(0.9),
            latency_p99: self.latency(0.99),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RPS={:.2}, ErrorRate={:.2}, Skipped={}, p50={:?}, p90={:?}, p99={:?}",
            self.requests_per_sec(),
            self.error_rate(),
            self.skipped,
            self.latency(0.5),
            self.latency(0.90),
            self.latency(0.99),
        )
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_measurement() {
        let m = Measurement::new(Duration::from_secs(1));
        assert_eq!(m.requests_per_sec(), 0.);
        assert_eq!(m.error_rate(), 0.);
        assert_eq!(m.latency(0.99), Duration::ZERO);
    }

    #[test]
    fn accumulates() {
        let data = ProvisionalData {
            success: 30,
            error: 10,
            skipped: 5,
            no_eligible: 0,
            dispatched: BTreeMap::from([("async".to_string(), 40)]),
            latency: (1..=40).map(Duration::from_millis).collect(),
        };

        let mut m = Measurement::from_data(&data, Duration::from_secs(2));
        m.add(&data);

        assert_eq!(m.requests(), 80);
        assert_eq!(m.skipped, 10);
        assert_eq!(m.dispatched["async"], 80);
        assert_eq!(m.requests_per_sec(), 40.);
        assert!((m.error_rate() - 0.25).abs() < f64::EPSILON);

        let p50 = m.latency(0.5);
        assert!(p50 > Duration::from_millis(10) && p50 < Duration::from_millis(30));

        let stats = m.statistics(4);
        assert_eq!(stats.users, 4);
        assert_eq!(stats.iterations(), 90);
        assert_eq!(stats.dispatched("async"), 80);
        assert_eq!(stats.dispatched("sync"), 0);
    }
}
