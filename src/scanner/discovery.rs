//! OPTIONS discovery and allowed-method extraction

use crate::error::Result;
use crate::http::Transport;
use crate::models::HeaderTable;
use reqwest::Method;
use tracing::debug;

/// Headers that advertise the method set, in extraction order
const METHOD_HEADERS: [&str; 2] = ["allow", "access-control-allow-methods"];

/// Outcome of the baseline OPTIONS probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub status: u16,
    /// Allowed methods; only extracted when the probe returned 200
    pub allowed_methods: Vec<String>,
}

impl Discovery {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Sends the baseline OPTIONS request
pub async fn discover<T: Transport + ?Sized>(transport: &T, url: &str) -> Result<Discovery> {
    let response = transport.send(Method::OPTIONS, url, &[]).await?;
    debug!("OPTIONS {url} returned {}", response.status());

    let allowed_methods = if response.status() == 200 {
        extract_allowed_methods(response.headers())
    } else {
        Vec::new()
    };

    Ok(Discovery {
        status: response.status(),
        allowed_methods,
    })
}

/// Splits `Allow` and `Access-Control-Allow-Methods` on commas, keeping the
/// first occurrence of each token.
pub fn extract_allowed_methods(headers: &HeaderTable) -> Vec<String> {
    let mut methods: Vec<String> = Vec::new();

    for name in METHOD_HEADERS {
        for value in headers.get_all(name) {
            for token in value.split(',').map(str::trim) {
                if !token.is_empty() && !methods.iter().any(|m| m == token) {
                    methods.push(token.to_string());
                }
            }
        }
    }

    methods
}

/// Case-insensitive membership test on an allowed-method list
pub fn allows(methods: &[String], method: &str) -> bool {
    methods.iter().any(|m| m.eq_ignore_ascii_case(method))
}
