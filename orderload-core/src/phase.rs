use crate::{ConfigError, ASYNC_ACTION, ASYNC_PATH, PRIMARY_WEIGHT, SYNC_ACTION, SYNC_PATH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named rollout stages of the order service.
///
/// - `One`: only the synchronous endpoint takes traffic.
/// - `Three`: traffic moved to the asynchronous endpoint; the synchronous action is kept as
///   a disabled placeholder which never touches the network.
///
/// Anything in between is an arbitrary weight table rather than a named preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    One,
    Three,
}

impl Phase {
    pub fn weights(&self) -> BTreeMap<String, u32> {
        let (sync, async_) = match self {
            Phase::One => (PRIMARY_WEIGHT, 0),
            Phase::Three => (0, PRIMARY_WEIGHT),
        };
        BTreeMap::from([
            (SYNC_ACTION.to_string(), sync),
            (ASYNC_ACTION.to_string(), async_),
        ])
    }

    pub fn endpoints(&self) -> BTreeMap<String, Option<String>> {
        let sync = match self {
            Phase::One => Some(SYNC_PATH.to_string()),
            Phase::Three => None,
        };
        BTreeMap::from([
            (SYNC_ACTION.to_string(), sync),
            (ASYNC_ACTION.to_string(), Some(ASYNC_PATH.to_string())),
        ])
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized
            .trim_start_matches("phase")
            .trim_start_matches(['-', '_', ' ']);
        match normalized {
            "1" | "one" => Ok(Phase::One),
            "3" | "three" => Ok(Phase::Three),
            _ => Err(ConfigError::UnknownPhase(s.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::One => write!(f, "phase 1"),
            Phase::Three => write!(f, "phase 3"),
        }
    }
}
