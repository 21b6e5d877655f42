use crate::measurement::Measurement;
use crate::profile::BehaviorProfile;
use crate::recorder::Recorder;
use crate::timer::Timer;
use crate::transport::Transport;
use crate::virtual_user::run_virtual_user;
use arc_swap::ArcSwap;
use orderload_core::RunStatistics;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// A set of concurrently running virtual users sharing one profile, transport and recorder.
///
/// Must be driven from within a tokio runtime. Dropping the swarm aborts every user.
pub struct Swarm<T> {
    profile: Arc<ArcSwap<BehaviorProfile>>,
    transport: Arc<T>,
    recorder: Recorder,
    tasks: Vec<JoinHandle<()>>,
    seed: Option<u64>,
    spawned: u64,
}

impl<T> Swarm<T>
where
    T: Transport + Sync + 'static,
{
    pub fn new(profile: BehaviorProfile, transport: Arc<T>) -> Self {
        Self {
            profile: Arc::new(ArcSwap::from_pointee(profile)),
            transport,
            recorder: Recorder::new(),
            tasks: vec![],
            seed: None,
            spawned: 0,
        }
    }

    /// Seed each user's random source with `seed + user index` instead of entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Grow or shrink the swarm. Removed users are aborted, dropping any request they
    /// have in flight.
    pub fn set_users(&mut self, users: usize) {
        if self.tasks.len() > users {
            debug!("Stopping {} virtual users", self.tasks.len() - users);
            for handle in self.tasks.drain(users..) {
                handle.abort();
            }
        } else if self.tasks.len() < users {
            debug!("Starting {} virtual users", users - self.tasks.len());
            while self.tasks.len() < users {
                let id = self.spawned;
                self.spawned += 1;

                let rng = match self.seed {
                    Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(id)),
                    None => SmallRng::from_entropy(),
                };

                self.tasks.push(tokio::spawn(run_virtual_user(
                    id,
                    self.profile.clone(),
                    self.transport.clone(),
                    self.recorder.clone(),
                    rng,
                )));
            }
        }
    }

    pub fn users(&self) -> usize {
        self.tasks.len()
    }

    /// Swap the profile of every running user. Each user picks it up at its next
    /// iteration.
    pub fn reconfigure(&self, profile: BehaviorProfile) {
        info!("Reconfiguring virtual users for {}", profile.host());
        self.profile.store(Arc::new(profile));
    }

    pub fn profile(&self) -> Arc<BehaviorProfile> {
        self.profile.load_full()
    }

    /// Let the current users run for `duration`, logging a measurement every
    /// `report_interval`, then stop all of them.
    #[instrument(name = "run", skip_all, fields(users = self.users()))]
    pub async fn run_for(&mut self, duration: Duration, report_interval: Duration) -> RunStatistics {
        let users = self.users();
        let start = Instant::now();
        let mut timer = Timer::new(report_interval).await;
        let mut total = Measurement::new(Duration::ZERO);

        info!("Running {users} virtual users for {}", humantime::format_duration(duration));

        loop {
            let remaining = duration.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, timer.tick()).await {
                Ok(elapsed) => {
                    let data = self.recorder.collect();
                    let measurement = Measurement::from_data(&data, elapsed);
                    if measurement.no_eligible > 0 {
                        warn!("{} iterations had no eligible action", measurement.no_eligible);
                    }
                    info!("{measurement}");
                    total.add(&data);
                }
                Err(_) => break,
            }
        }

        self.stop_all().await;

        let tail = self.recorder.collect();
        trace!("Collected {} trailing iterations over {:?}", tail.iterations(), timer.since_last_tick());
        total.add(&tail);
        total.elapsed = start.elapsed();

        let stats = total.statistics(users);
        info!("Run complete: {stats}");
        stats
    }

    /// Abort every user and wait for the aborts to land, so nothing is recorded after this
    /// returns.
    async fn stop_all(&mut self) {
        let handles: Vec<_> = self.tasks.drain(..).collect();
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    error!("Virtual user panicked: {err}");
                }
            }
        }
    }

    pub fn shutdown(mut self) {
        self.set_users(0);
    }
}

impl<T> Drop for Swarm<T> {
    fn drop(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
    }
}
