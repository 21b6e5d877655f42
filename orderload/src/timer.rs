use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// Shortest allowed report interval. `tokio::time::interval` panics on zero.
pub(crate) const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Fixed cadence ticker which reports the real time elapsed between ticks.
pub(crate) struct Timer {
    interval: Interval,
    last_tick: Instant,
    interval_dur: Duration,
}

impl Timer {
    pub async fn new(interval_dur: Duration) -> Self {
        let interval_dur = interval_dur.max(MIN_INTERVAL);
        let mut interval = interval(interval_dur);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // NOTE: First tick completes instantly
        let last_tick = interval.tick().await;
        Self {
            interval,
            last_tick,
            interval_dur,
        }
    }

    pub async fn tick(&mut self) -> Duration {
        let next = self.interval.tick().await;
        let elapsed = self.last_tick.elapsed();
        self.last_tick = next;
        elapsed
    }

    /// Time since the last tick, for the partial window at the end of a run.
    pub fn since_last_tick(&self) -> Duration {
        self.last_tick.elapsed()
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", humantime::format_duration(self.interval_dur))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_interval_is_clamped() {
        let mut timer = Timer::new(Duration::ZERO).await;
        assert_eq!(timer.to_string(), "10ms");
        let elapsed = timer.tick().await;
        assert!(elapsed >= Duration::from_millis(9));
    }
}
