// src/ingest/fetch.rs
use std::time::Duration;

use anyhow::Context;

use crate::ingest::types::{FetchError, RawFetcher, SourceRequest};

const USER_AGENT: &str = concat!(
    "geohazard-ingest/",
    env!("CARGO_PKG_VERSION"),
    " (hazard map data pipeline)"
);

/// `reqwest`-backed transport for live sources.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl RawFetcher for HttpFetcher {
    async fn fetch_raw(&self, request: &SourceRequest) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .http
            .get(&request.url)
            .query(&request.query)
            .send()
            .await
            .map_err(map_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(map_error)?;
        Ok(body.to_vec())
    }
}

// Query strings may hold credentials, so the URL never reaches the message.
fn map_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Transport(e.without_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("geohazard-ingest/"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        // Nothing listens on the discard port.
        let req = SourceRequest::get("http://127.0.0.1:9/feed").with_query("appid", "secret");
        match fetcher.fetch_raw(&req).await {
            Err(FetchError::Transport(msg)) => assert!(!msg.contains("secret")),
            Err(FetchError::Timeout) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
