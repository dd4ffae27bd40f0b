//! HTTP client adapter for verbtunnel

pub mod client;
pub use client::HttpClient;

use crate::error::Result;
use crate::models::ExchangeResult;
use async_trait::async_trait;
use reqwest::Method;

/// Issues one HTTP request and returns the observed exchange.
///
/// Implementations never retry: any connection, DNS, TLS or timeout failure
/// is returned as `ProbeError::Network` and the caller decides what to do.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ExchangeResult>;
}
