// src/core/net.rs
// Blocking HTTP GET for dataset fetches.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::consts::{HTTP_TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct Http {
    client: Client,
}

impl Http {
    pub fn new(skip_ssl_verification: bool) -> Result<Self, NetError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .danger_accept_invalid_certs(skip_ssl_verification)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` with query `params`; non-2xx is an error carrying the body.
    pub fn get_text(&self, url: &str, params: &[(&str, &str)]) -> Result<String, NetError> {
        let resp = self.client.get(url).query(params).send()?;
        let status = resp.status();
        let final_url = resp.url().to_string();
        let body = resp.text()?;
        debug!(%status, url = %final_url, bytes = body.len(), "GET");

        if !status.is_success() {
            return Err(NetError::Status { status: status.as_u16(), url: final_url, body: snippet(&body) });
        }
        Ok(body)
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T, NetError> {
        let body = self.get_text(url, params)?;
        serde_json::from_str(&body).map_err(|e| NetError::Decode { url: s!(url), reason: e.to_string() })
    }
}

/// Error bodies can be whole HTML pages; keep the log line readable.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}…", &body[..i]),
        None => s!(body),
    }
}
