//! reqwest-backed transport with a shared connection pool and request tracking

use crate::error::Result;
use crate::http::Transport;
use crate::models::{ExchangeResult, HeaderTable, ScanConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client wrapper with request counting.
///
/// Cloning is cheap and clones share the connection pool and the counter.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_count: Arc<AtomicU64>,
}

impl HttpClient {
    /// Creates a new HttpClient from scan configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        // Targets include self-signed and internal test hosts.
        warn!("TLS certificate validation is disabled for all probe requests");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .default_headers(default_headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ExchangeResult> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let mut req = self.client.request(method.clone(), url);
        for (key, value) in headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.send().await.map_err(|e| {
            debug!("{method} {url} failed: {e}");
            e
        })?;

        let status = response.status().as_u16();
        debug!("Response: {status} for {method} {url}");

        let mut table = HeaderTable::new();
        for (name, value) in response.headers() {
            table.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("Could not read body from {url}: {e}");
                String::new()
            }
        };

        Ok(ExchangeResult::new(status, table, body))
    }
}
