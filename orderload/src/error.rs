use thiserror::Error;

pub use orderload_core::ConfigError;

/// Every action weight is zero, so there is nothing to select.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no eligible action: every action weight is zero")]
pub struct NoEligibleAction;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("POST {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("POST {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Failure of a single iteration. Never fatal to the virtual user running it.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error(transparent)]
    NoEligibleAction(#[from] NoEligibleAction),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
