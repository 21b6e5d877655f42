//! Virtual user behavior.
//!
//! A [`BehaviorProfile`] is built once from static configuration and then shared read-only
//! by every virtual user running it. All randomness comes from the `Rng` handed to each
//! call, and all network access goes through a [`Transport`], so a profile holds no
//! mutable state of its own.
use crate::action::{Action, ActionKind};
use crate::error::{ConfigError, IterationError, NoEligibleAction, TransportError};
use crate::recorder::Recorder;
use crate::transport::Transport;
use orderload_core::{
    normalize_host, LineItem, OrderPayload, PayloadConfig, ProfileConfig, WaitRange,
};
use rand::Rng;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Clone, Debug)]
pub struct BehaviorProfile {
    host: String,
    wait: WaitRange,
    actions: Vec<Action>,
    total_weight: u64,
    payload: PayloadConfig,
}

/// What a successful iteration did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IterationOutcome {
    Dispatched {
        action: String,
        url: String,
        status: u16,
    },
    Skipped {
        action: String,
    },
}

impl BehaviorProfile {
    /// Build a profile from an explicit, ordered action list.
    ///
    /// Fails if `host` is not an absolute http(s) URL or `actions` is empty. An action list
    /// whose weights are all zero is accepted; selecting from it fails instead.
    pub fn configure(
        host: &str,
        wait: WaitRange,
        actions: Vec<Action>,
    ) -> Result<Self, ConfigError> {
        if actions.is_empty() {
            return Err(ConfigError::NoActions);
        }

        let host = normalize_host(host)?;
        let total_weight = actions.iter().map(|a| u64::from(a.weight())).sum();

        Ok(Self {
            host,
            wait,
            actions,
            total_weight,
            payload: PayloadConfig::default(),
        })
    }

    pub fn with_payload(mut self, payload: PayloadConfig) -> Result<Self, ConfigError> {
        payload.validate()?;
        self.payload = payload;
        Ok(self)
    }

    /// Build a profile from a weight table. Actions are ordered by name.
    pub fn from_config(config: &ProfileConfig) -> Result<Self, ConfigError> {
        let actions = config
            .weights
            .iter()
            .map(|(name, weight)| {
                Ok(match config.endpoint(name)? {
                    Some(path) => Action::post(name, *weight, &path),
                    None => Action::noop(name, *weight),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Self::configure(&config.host, config.wait_range()?, actions)?
            .with_payload(config.payload.clone())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn wait_range(&self) -> WaitRange {
        self.wait
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// Think-time before the next iteration, uniform over the inclusive wait range.
    pub fn next_wait_duration<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = as_nanos(self.wait.min());
        let max = as_nanos(self.wait.max());
        if min == max {
            return self.wait.min();
        }
        Duration::from_nanos(rng.gen_range(min..=max))
    }

    /// Weighted random selection.
    ///
    /// Each action owns the interval `[start, start + weight)` on `[0, total_weight)`, laid
    /// out in list order. A zero weight action owns an empty interval and can never be
    /// returned.
    pub fn select_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Action, NoEligibleAction> {
        if self.total_weight == 0 {
            return Err(NoEligibleAction);
        }

        let draw = rng.gen_range(0..self.total_weight);
        let mut end = 0;
        for action in &self.actions {
            end += u64::from(action.weight());
            if draw < end {
                return Ok(action);
            }
        }

        unreachable!("draw {draw} is below total weight {}", self.total_weight)
    }

    /// A fresh order with one line per configured item.
    pub fn build_payload<R: Rng + ?Sized>(&self, rng: &mut R) -> OrderPayload {
        OrderPayload {
            customer_id: rng.gen_range(self.payload.customer_id.clone()),
            items: self
                .payload
                .items
                .iter()
                .map(|item| LineItem {
                    item_id: item.item_id.clone(),
                    quantity: rng.gen_range(item.quantity.clone()),
                })
                .collect(),
        }
    }

    /// Select an action and execute it, recording the outcome.
    ///
    /// Posting actions send exactly one request. Non-2xx responses are errors.
    pub async fn run_iteration<R, T>(
        &self,
        rng: &mut R,
        transport: &T,
        recorder: &Recorder,
    ) -> Result<IterationOutcome, IterationError>
    where
        R: Rng + ?Sized,
        T: Transport,
    {
        let action = match self.select_action(rng) {
            Ok(action) => action,
            Err(err) => {
                recorder.record_no_eligible();
                return Err(err.into());
            }
        };

        let path = match action.kind() {
            ActionKind::PostOrder { path } => path,
            ActionKind::Noop => {
                trace!("Skipping placeholder action {}", action.name());
                recorder.record_skipped(action.name());
                return Ok(IterationOutcome::Skipped {
                    action: action.name().to_string(),
                });
            }
        };

        let url = self.url(path);
        let payload = self.build_payload(rng);
        trace!("POST {url} customer_id={}", payload.customer_id);

        let status = recorder
            .record(action.name(), async {
                let status = transport.post_json(&url, &payload).await?;
                if (200..300).contains(&status) {
                    Ok(status)
                } else {
                    Err(TransportError::Status {
                        url: url.clone(),
                        status,
                    })
                }
            })
            .await?;

        Ok(IterationOutcome::Dispatched {
            action: action.name().to_string(),
            url,
            status,
        })
    }
}

fn as_nanos(dur: Duration) -> u64 {
    u64::try_from(dur.as_nanos()).unwrap_or(u64::MAX)
}
