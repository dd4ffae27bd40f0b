//! Response classifiers for override batteries

use crate::models::ExchangeResult;

/// Content type a server uses when echoing a TRACE request
const TRACE_CONTENT_TYPE: &str = "message/http";

/// Markers that must be echoed in the body, besides the override header name
const TRACE_BODY_MARKERS: [&str; 3] = ["user-agent", "accept", "x-test-trace"];

/// Markers needed out of four. Tolerates a truncated echo while still
/// rejecting a single coincidental match.
const TRACE_MARKER_THRESHOLD: usize = 3;

/// Returns true if the exchange looks like a TRACE echo produced through an
/// override header.
pub fn is_vulnerable_trace(result: &ExchangeResult) -> bool {
    if result.status() != 200 {
        return false;
    }

    if !result
        .content_type()
        .to_lowercase()
        .contains(TRACE_CONTENT_TYPE)
    {
        return false;
    }

    trace_marker_count(result) >= TRACE_MARKER_THRESHOLD
}

/// Counts how many of the four expected markers appear in the body
pub fn trace_marker_count(result: &ExchangeResult) -> usize {
    let body = result.body().to_lowercase();
    let header = result
        .override_header()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let header_hit = usize::from(!header.is_empty() && body.contains(&header));
    header_hit
        + TRACE_BODY_MARKERS
            .iter()
            .filter(|marker| body.contains(*marker))
            .count()
}

/// Returns true if a smuggled OPTIONS request succeeded
pub fn is_vulnerable_options_override(result: &ExchangeResult) -> bool {
    result.status() == 200
}
