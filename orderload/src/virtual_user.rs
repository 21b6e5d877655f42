use crate::error::IterationError;
use crate::profile::{BehaviorProfile, IterationOutcome};
use crate::recorder::Recorder;
use crate::transport::Transport;
use arc_swap::ArcSwap;
use rand::rngs::SmallRng;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Run one virtual user until its task is aborted.
///
/// Iterations are strictly sequential: select and execute an action, then idle for the
/// profile's think-time. The profile is re-read at the start of every iteration so a
/// reconfiguration takes effect between iterations, never in the middle of one.
#[instrument(name = "user", skip_all, fields(id = id))]
pub(crate) async fn run_virtual_user<T>(
    id: u64,
    profile: Arc<ArcSwap<BehaviorProfile>>,
    transport: Arc<T>,
    recorder: Recorder,
    mut rng: SmallRng,
) where
    T: Transport + Sync,
{
    debug!("Virtual user started");
    let mut warned_no_eligible = false;

    loop {
        let current = profile.load_full();

        match current
            .run_iteration(&mut rng, transport.as_ref(), &recorder)
            .await
        {
            Ok(IterationOutcome::Dispatched { url, status, .. }) => {
                trace!("POST {url} -> {status}");
                warned_no_eligible = false;
            }
            Ok(IterationOutcome::Skipped { action }) => {
                trace!("Skipped placeholder action {action}");
                warned_no_eligible = false;
            }
            Err(IterationError::NoEligibleAction(err)) => {
                // Keep idling; a reconfiguration may enable an action again.
                if !warned_no_eligible {
                    warn!("{err}");
                    warned_no_eligible = true;
                }
            }
            Err(IterationError::Transport(err)) => {
                debug!("Iteration failed: {err}");
            }
        }

        tokio::time::sleep(current.next_wait_duration(&mut rng)).await;
    }
}
