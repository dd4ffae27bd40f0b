//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Mutex;
use verbtunnel::error::{ProbeError, Result};
use verbtunnel::http::Transport;
use verbtunnel::models::{ExchangeResult, HeaderTable, ScanConfig};

/// Creates a test ScanConfig pointing to a wiremock server
pub fn test_config(target: &str) -> ScanConfig {
    ScanConfig {
        target: Some(target.to_string()),
        concurrency: 2,
        timeout_secs: 5,
        ..ScanConfig::default()
    }
}

/// Scripted reply for the stub transport
#[derive(Clone)]
pub enum Reply {
    Respond(ExchangeResult),
    Fail,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Reply::Respond(ExchangeResult::new(status, HeaderTable::new(), ""))
    }

    pub fn with_headers(status: u16, headers: HeaderTable) -> Self {
        Reply::Respond(ExchangeResult::new(status, headers, ""))
    }
}

/// One request seen by the stub
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Transport that answers from a script and records every request
pub struct StubTransport {
    options: Reply,
    overrides: HashMap<String, Reply>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

impl StubTransport {
    /// `options` answers the discovery probe; override requests get `fallback`
    /// unless a reply is scripted for their override header.
    pub fn new(options: Reply, fallback: Reply) -> Self {
        Self {
            options,
            overrides: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_header(mut self, header: &str, reply: Reply) -> Self {
        self.overrides.insert(header.to_ascii_lowercase(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn override_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != Method::OPTIONS)
            .collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ExchangeResult> {
        self.calls.lock().expect("lock").push(Call {
            method: method.clone(),
            url: url.to_string(),
            headers: headers.to_vec(),
        });

        let reply = if method == Method::OPTIONS {
            &self.options
        } else {
            headers
                .first()
                .and_then(|(name, _)| self.overrides.get(&name.to_ascii_lowercase()))
                .unwrap_or(&self.fallback)
        };

        match reply {
            Reply::Respond(result) => Ok(result.clone()),
            Reply::Fail => Err(ProbeError::Network("connection refused".to_string())),
        }
    }
}
