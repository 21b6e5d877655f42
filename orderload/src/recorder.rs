use metrics_util::AtomicBucket;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
const SUCCESS_COUNTER: &str = "orderload.success";
#[cfg(feature = "metrics")]
const ERROR_COUNTER: &str = "orderload.error";
#[cfg(feature = "metrics")]
const SKIPPED_COUNTER: &str = "orderload.skipped";
#[cfg(feature = "metrics")]
const NO_ELIGIBLE_COUNTER: &str = "orderload.no_eligible";
#[cfg(feature = "metrics")]
const LATENCY_HISTOGRAM: &str = "orderload.latency";

/// Outcome counters shared by every virtual user of a run.
///
/// Cloning is cheap; all clones feed the same counters. [`Recorder::collect`] drains them.
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<Counters>,
}

struct Counters {
    success: AtomicU64,
    error: AtomicU64,
    skipped: AtomicU64,
    no_eligible: AtomicU64,
    dispatched: Mutex<BTreeMap<String, u64>>,
    latency: AtomicBucket<Duration>,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            success: AtomicU64::new(0),
            error: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            no_eligible: AtomicU64::new(0),
            dispatched: Mutex::new(BTreeMap::new()),
            latency: AtomicBucket::new(),
        }
    }
}

impl Recorder {
    pub fn new() -> Self {
        #[cfg(feature = "metrics")]
        describe_metrics();

        Self::default()
    }

    /// Time `func`, then count it as a success or an error for `action`.
    pub async fn record<T, R, E>(&self, action: &str, func: T) -> Result<R, E>
    where
        T: Future<Output = Result<R, E>>,
    {
        {
            let mut dispatched = self
                .inner
                .dispatched
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *dispatched.entry(action.to_string()).or_default() += 1;
        }

        let start = Instant::now();
        let res = func.await;
        let elapsed = start.elapsed();
        self.inner.latency.push(elapsed);

        #[cfg(feature = "metrics")]
        metrics::histogram!(LATENCY_HISTOGRAM, "action" => action.to_string())
            .record(elapsed.as_secs_f64());

        if res.is_ok() {
            self.inner.success.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!(SUCCESS_COUNTER, "action" => action.to_string()).increment(1);
        } else {
            self.inner.error.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!(ERROR_COUNTER, "action" => action.to_string()).increment(1);
        }

        res
    }

    #[allow(unused_variables)]
    pub fn record_skipped(&self, action: &str) {
        self.inner.skipped.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(SKIPPED_COUNTER, "action" => action.to_string()).increment(1);
    }

    pub fn record_no_eligible(&self) {
        self.inner.no_eligible.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(NO_ELIGIBLE_COUNTER).increment(1);
    }

    /// Drain everything recorded since the previous call.
    pub fn collect(&self) -> ProvisionalData {
        let success = self.inner.success.swap(0, Ordering::Relaxed);
        let error = self.inner.error.swap(0, Ordering::Relaxed);
        let skipped = self.inner.skipped.swap(0, Ordering::Relaxed);
        let no_eligible = self.inner.no_eligible.swap(0, Ordering::Relaxed);
        let dispatched = std::mem::take(
            &mut *self
                .inner
                .dispatched
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut latency = vec![];
        self.inner.latency.clear_with(|dur| {
            latency.extend_from_slice(dur);
        });

        ProvisionalData {
            success,
            error,
            skipped,
            no_eligible,
            dispatched,
            latency,
        }
    }
}

/// Raw counts drained from a [`Recorder`].
#[derive(Debug, Default)]
pub struct ProvisionalData {
    pub success: u64,
    pub error: u64,
    pub skipped: u64,
    pub no_eligible: u64,
    pub dispatched: BTreeMap<String, u64>,
    pub latency: Vec<Duration>,
}

impl ProvisionalData {
    pub fn iterations(&self) -> u64 {
        self.success + self.error + self.skipped + self.no_eligible
    }
}

#[cfg(feature = "metrics")]
fn describe_metrics() {
    use std::sync::Once;

    static DESCRIBE: Once = Once::new();
    DESCRIBE.call_once(|| {
        metrics::describe_counter!(SUCCESS_COUNTER, "Requests answered with a 2xx status");
        metrics::describe_counter!(ERROR_COUNTER, "Requests which failed or got a non-2xx status");
        metrics::describe_counter!(SKIPPED_COUNTER, "Iterations which selected a no-op action");
        metrics::describe_counter!(NO_ELIGIBLE_COUNTER, "Iterations with every weight at zero");
        metrics::describe_histogram!(
            LATENCY_HISTOGRAM,
            metrics::Unit::Seconds,
            "Request round trip time"
        );
    });
}
