//! `HttpClient` adapter on `ureq`.

use std::io::Read as _;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{HttpClient, HttpResponse};

/// Bodies larger than this are truncated; verifiers only need the greeting.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Blocking `ureq` agent driven from `spawn_blocking`.
#[derive(Clone)]
pub struct UreqHttpClient {
    agent: ureq::Agent,
}

impl UreqHttpClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("tfcheck/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

fn read_body(response: ureq::Response) -> Result<String> {
    let mut body = String::new();
    response
        .into_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut body)
        .context("reading response body")?;
    Ok(body)
}

impl HttpClient for UreqHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let agent = self.agent.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || match agent.get(&url).call() {
            Ok(response) => {
                let status = response.status();
                Ok(HttpResponse {
                    status,
                    body: read_body(response)?,
                })
            }
            // Non-2xx statuses are answers, not transport failures.
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: read_body(response).unwrap_or_default(),
            }),
            Err(err) => Err(anyhow::Error::new(err).context(format!("GET {url}"))),
        })
        .await
        .context("HTTP task panicked")?
    }
}
