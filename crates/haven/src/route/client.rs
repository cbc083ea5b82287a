//! HTTP client for the routing service.

use std::time::Duration;

use reqwest::Client;

use super::{PathRequest, PathResult, RequestWire, RouteError};

/// Path of the routing endpoint under the service base URL.
pub const SHORTEST_PATH: &str = "/shortest-path";

const TIMEOUT: Duration = Duration::from_secs(30);

pub struct RouteClient {
    client: Client,
    base_url: String,
}

impl RouteClient {
    pub fn new(endpoint: &str) -> Result<Self, RouteError> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, SHORTEST_PATH)
    }

    /// POST the request and decode the body. The service answers failures
    /// with a non-2xx status and an `{error}` body, so the status is logged
    /// but not used to pick the decoding.
    pub async fn shortest_path(&self, request: &PathRequest) -> Result<PathResult, RouteError> {
        let url = self.url();
        let resp = self
            .client
            .post(&url)
            .json(&RequestWire::from(request))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        tracing::debug!(%url, %status, bytes = body.len(), "routing response");
        PathResult::from_json(&body)
    }
}
