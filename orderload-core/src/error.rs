use thiserror::Error;

/// Invalid profile or run configuration. Detected before any virtual user starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("wait range is inverted: min {min}s > max {max}s")]
    InvertedWaitRange { min: f64, max: f64 },

    #[error("wait range bound {0}s is negative or not finite")]
    InvalidWaitBound(f64),

    #[error("profile has no actions")]
    NoActions,

    #[error("invalid target host `{host}`: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("no endpoint is known for action `{0}`")]
    UnknownAction(String),

    #[error("range for `{name}` is empty: {min} > {max}")]
    EmptyRange { name: String, min: u32, max: u32 },

    #[error("malformed weight entry `{0}`, expected name=weight")]
    MalformedWeight(String),

    #[error("unknown phase `{0}`, expected 1 or 3")]
    UnknownPhase(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
