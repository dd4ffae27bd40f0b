//! Override header battery

use crate::error::{ProbeError, Result};
use crate::http::Transport;
use crate::models::{ExchangeResult, OverrideAttempt};
use reqwest::Method;
use tracing::{debug, warn};

/// Override header candidates in priority order
pub const OVERRIDE_HEADERS: [&str; 6] = [
    "X-HTTP-Method-Override",
    "X-HTTP-Method",
    "X-Method-Override",
    "_method",
    "X-Original-HTTP-Method",
    "X-Override-Method",
];

/// Results of one battery plus the number of requests it dispatched
#[derive(Debug, Clone)]
pub struct BatteryOutcome {
    pub results: Vec<ExchangeResult>,
    pub requests_sent: u64,
}

/// Sends one `base_method` request per override header, asking for
/// `target_method`. Requests go out one at a time in priority order.
///
/// Network failures on a single header are skipped. Fails with
/// `AllAttemptsFailed` only when no header produced a response.
pub async fn try_overrides<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    base_method: &str,
    target_method: &str,
) -> Result<BatteryOutcome> {
    let method = Method::from_bytes(base_method.as_bytes())
        .map_err(|_| ProbeError::InvalidInput(format!("invalid HTTP method: {base_method}")))?;

    let mut results = Vec::new();
    let mut requests_sent = 0;

    for header in OVERRIDE_HEADERS {
        let attempt = OverrideAttempt::new(header, base_method, target_method);
        requests_sent += 1;

        match transport
            .send(method.clone(), url, &attempt.request_headers())
            .await
        {
            Ok(result) => {
                debug!(
                    "{} {url} with {}: {} -> {}",
                    attempt.base_method,
                    attempt.override_header,
                    attempt.target_method,
                    result.status()
                );
                results.push(result.with_override_header(attempt.override_header));
            }
            Err(e) => {
                warn!("Override attempt with {header} against {url} failed: {e}");
            }
        }
    }

    if results.is_empty() {
        return Err(ProbeError::AllAttemptsFailed {
            target_method: target_method.to_string(),
        });
    }

    Ok(BatteryOutcome {
        results,
        requests_sent,
    })
}
