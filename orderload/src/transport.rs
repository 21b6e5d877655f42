//! HTTP seam between virtual users and the network.
//!
//! Virtual users only see the [`Transport`] trait, which keeps the behavior profile testable
//! without a server. [`ReqwestTransport`] is the production implementation; a single
//! instance is shared by all virtual users so they share its connection pool.
use crate::error::TransportError;
use orderload_core::OrderPayload;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// POST `body` as JSON to `url` and return the response status code.
    ///
    /// Only failures to complete the exchange are errors here. Status classification is
    /// left to the caller.
    async fn post_json(&self, url: &str, body: &OrderPayload) -> Result<u16, TransportError>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &OrderPayload) -> Result<u16, TransportError> {
        let res = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(res.status().as_u16())
    }
}
