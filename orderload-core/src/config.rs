use crate::{
    ConfigError, Phase, ASYNC_ACTION, ASYNC_PATH, DEFAULT_CUSTOMER_MAX, DEFAULT_CUSTOMER_MIN,
    DEFAULT_HOST, DEFAULT_REPORT_INTERVAL, DEFAULT_RUN_DURATION, DEFAULT_USERS,
    DEFAULT_WAIT_MAX, DEFAULT_WAIT_MIN, SYNC_ACTION, SYNC_PATH,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Validated think-time range. `min <= max` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitRange {
    min: Duration,
    max: Duration,
}

impl WaitRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedWaitRange {
                min: min.as_secs_f64(),
                max: max.as_secs_f64(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn from_secs_f64(min: f64, max: f64) -> Result<Self, ConfigError> {
        for bound in [min, max] {
            if !bound.is_finite() || bound < 0. {
                return Err(ConfigError::InvalidWaitBound(bound));
            }
        }
        if min > max {
            return Err(ConfigError::InvertedWaitRange { min, max });
        }
        let to_duration = |secs: f64| {
            Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidWaitBound(secs))
        };
        Self::new(to_duration(min)?, to_duration(max)?)
    }

    /// A range which always yields `wait`.
    pub fn fixed(wait: Duration) -> Self {
        Self {
            min: wait,
            max: wait,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for WaitRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_WAIT_MIN,
            max: DEFAULT_WAIT_MAX,
        }
    }
}

/// Bounds used to generate the body of each order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub customer_id: RangeInclusive<u32>,
    pub items: Vec<ItemSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub item_id: String,
    pub quantity: RangeInclusive<u32>,
}

impl ItemSpec {
    pub fn new(item_id: &str, quantity: RangeInclusive<u32>) -> Self {
        Self {
            item_id: item_id.to_string(),
            quantity,
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            customer_id: DEFAULT_CUSTOMER_MIN..=DEFAULT_CUSTOMER_MAX,
            items: vec![ItemSpec::new("item-a", 1..=3), ItemSpec::new("item-b", 1..=2)],
        }
    }
}

impl PayloadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("customer_id", &self.customer_id)?;
        for item in &self.items {
            check_range(&item.item_id, &item.quantity)?;
        }
        Ok(())
    }
}

fn check_range(name: &str, range: &RangeInclusive<u32>) -> Result<(), ConfigError> {
    if range.start() > range.end() {
        Err(ConfigError::EmptyRange {
            name: name.to_string(),
            min: *range.start(),
            max: *range.end(),
        })
    } else {
        Ok(())
    }
}

/// Static description of one kind of simulated client.
///
/// `endpoints` maps an action name to the path it posts to. Only an explicit `null` path
/// makes the action a no-op placeholder. Names missing from `endpoints` fall back to the
/// built-in `sync` and `async` order routes, so a bare weight table posts to both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub host: String,
    /// `[min_secs, max_secs]`
    pub wait_range: (f64, f64),
    pub weights: BTreeMap<String, u32>,
    pub endpoints: BTreeMap<String, Option<String>>,
    pub payload: PayloadConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let wait = WaitRange::default();
        Self {
            host: DEFAULT_HOST.to_string(),
            wait_range: (wait.min().as_secs_f64(), wait.max().as_secs_f64()),
            weights: Phase::Three.weights(),
            endpoints: BTreeMap::new(),
            payload: PayloadConfig::default(),
        }
    }
}

impl ProfileConfig {
    pub fn for_phase(host: &str, phase: Phase) -> Self {
        Self {
            host: host.to_string(),
            weights: phase.weights(),
            endpoints: phase.endpoints(),
            ..Default::default()
        }
    }

    pub fn wait_range(&self) -> Result<WaitRange, ConfigError> {
        WaitRange::from_secs_f64(self.wait_range.0, self.wait_range.1)
    }

    /// Resolve the path an action posts to. `Ok(None)` means the action is a no-op.
    pub fn endpoint(&self, action: &str) -> Result<Option<String>, ConfigError> {
        if let Some(path) = self.endpoints.get(action) {
            return Ok(path.clone());
        }
        match action {
            SYNC_ACTION => Ok(Some(SYNC_PATH.to_string())),
            ASYNC_ACTION => Ok(Some(ASYNC_PATH.to_string())),
            _ => Err(ConfigError::UnknownAction(action.to_string())),
        }
    }

    /// Replace the weight table. A placeholder given a positive weight falls back to its
    /// regular route again; explicit paths are kept.
    pub fn with_weights(mut self, weights: BTreeMap<String, u32>) -> Self {
        for (name, weight) in &weights {
            if *weight > 0 && matches!(self.endpoints.get(name), Some(None)) {
                self.endpoints.remove(name);
            }
        }
        self.weights = weights;
        self
    }
}

/// Parse `sync=10,async=0` into a weight table.
pub fn parse_weights(s: &str) -> Result<BTreeMap<String, u32>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, weight) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedWeight(entry.to_string()))?;
            let weight = weight
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::MalformedWeight(entry.to_string()))?;
            Ok((name.trim().to_string(), weight))
        })
        .collect()
}

/// Check that `host` is an absolute http(s) URL and strip any trailing slash so paths
/// can be appended directly.
pub fn normalize_host(host: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidHost {
        host: host.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(host).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host().is_none() {
        return Err(invalid("missing host"));
    }

    Ok(host.trim_end_matches('/').to_string())
}

/// How many virtual users to run, and for how long.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub users: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub duration: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub report_interval: Duration,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS,
            duration: DEFAULT_RUN_DURATION,
            report_interval: DEFAULT_REPORT_INTERVAL,
            seed: None,
        }
    }
}

/// Top level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub profile: ProfileConfig,
    pub run: RunConfig,
}

impl FromStr for LoadConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
