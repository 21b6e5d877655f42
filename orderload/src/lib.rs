#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod action;
pub mod error;
pub mod measurement;
pub mod profile;
pub mod recorder;
pub mod swarm;
pub mod transport;

pub(crate) mod timer;
pub(crate) mod virtual_user;

pub use action::{Action, ActionKind};
pub use load_test::LoadTest;
pub use profile::{BehaviorProfile, IterationOutcome};
pub use swarm::Swarm;

pub mod prelude {
    pub use crate::action::{Action, ActionKind};
    pub use crate::error::{ConfigError, IterationError, NoEligibleAction, TransportError};
    pub use crate::load_test::LoadTest;
    pub use crate::profile::{BehaviorProfile, IterationOutcome};
    pub use crate::recorder::Recorder;
    pub use crate::swarm::Swarm;
    pub use crate::transport::{LocalTransport, ReqwestTransport, Transport};

    pub use orderload_core::{
        LoadConfig, OrderPayload, PayloadConfig, Phase, ProfileConfig, RunConfig,
        RunStatistics, WaitRange,
    };
}

/// Configuration and wire types, re-exported from `orderload-core`.
pub mod config {
    pub use orderload_core::*;
}
