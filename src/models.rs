//! Core data models for verbtunnel

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Response headers keyed by lowercase name. A header may repeat, so each
/// name maps to its values in the order they were received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under the normalized header name
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Builder-style variant of `append`
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// Returns every value received for `name` (case-insensitive)
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the first value received for `name` (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }
}

/// Outcome of one HTTP request/response pair. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeResult {
    status: u16,
    headers: HeaderTable,
    /// Empty if the body could not be read
    body: String,
    /// Absent for the discovery probe
    override_header: Option<String>,
}

impl ExchangeResult {
    pub fn new(status: u16, headers: HeaderTable, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            override_header: None,
        }
    }

    /// Tags the exchange with the override header that produced it
    pub fn with_override_header(mut self, name: impl Into<String>) -> Self {
        self.override_header = Some(name.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Override header that produced this exchange
    pub fn override_header(&self) -> Option<&str> {
        self.override_header.as_deref()
    }

    /// `Content-Type` header value, empty when absent
    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }

    /// Parsed `Content-Length` header value
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Advertised length, falling back to the number of body bytes read
    pub fn response_length(&self) -> u64 {
        self.content_length().unwrap_or(self.body.len() as u64)
    }
}

/// One (override header, base method, target method) triple tried against a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideAttempt {
    pub override_header: &'static str,
    pub base_method: String,
    pub target_method: String,
}

/// Marker header attached to TRACE attempts; its echo corroborates the finding
pub const TRACE_MARKER_HEADER: &str = "X-Test-Trace";
pub const TRACE_MARKER_VALUE: &str = "test-value";

impl OverrideAttempt {
    pub fn new(
        override_header: &'static str,
        base_method: impl Into<String>,
        target_method: impl Into<String>,
    ) -> Self {
        Self {
            override_header,
            base_method: base_method.into(),
            target_method: target_method.into(),
        }
    }

    /// Extra request headers for this attempt
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(
            self.override_header.to_string(),
            self.target_method.clone(),
        )];
        if self.target_method.eq_ignore_ascii_case("TRACE") {
            headers.push((
                TRACE_MARKER_HEADER.to_string(),
                TRACE_MARKER_VALUE.to_string(),
            ));
        }
        headers
    }
}

/// Kind of override that was found to be honored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VulnClass {
    /// TRACE smuggled through a safe method and echoed back
    TraceOverride,
    /// OPTIONS rejected directly but accepted through GET + override header
    OptionsOverride,
}

impl fmt::Display for VulnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VulnClass::TraceOverride => write!(f, "TRACE via method override"),
            VulnClass::OptionsOverride => write!(f, "OPTIONS via method override"),
        }
    }
}

/// Status returned for one override header in a battery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderStatus {
    pub header: String,
    pub status: u16,
}

/// Verdict for one battery, computed fresh per scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub vulnerable: bool,
    pub class: VulnClass,
    pub base_method: String,
    pub target_method: String,
    /// Exchanges that satisfied the classifier (empty if none)
    pub triggering: Vec<ExchangeResult>,
    /// Status per header that produced a response, in priority order
    pub summary: Vec<HeaderStatus>,
}

/// Maximum number of body characters kept in an evidence preview
pub const PREVIEW_LIMIT: usize = 200;

/// Operator-facing evidence for a single vulnerable exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub url: String,
    pub class: VulnClass,
    pub base_method: String,
    pub target_method: String,
    pub override_header: String,
    pub status: u16,
    pub content_type: String,
    pub response_length: u64,
    /// Body preview, `None` when the body was empty
    pub preview: Option<String>,
}

impl Evidence {
    pub fn from_exchange(
        url: &str,
        class: VulnClass,
        base_method: &str,
        target_method: &str,
        exchange: &ExchangeResult,
    ) -> Self {
        Self {
            url: url.to_string(),
            class,
            base_method: base_method.to_string(),
            target_method: target_method.to_string(),
            override_header: exchange.override_header().unwrap_or_default().to_string(),
            status: exchange.status(),
            content_type: exchange.content_type().to_string(),
            response_length: exchange.response_length(),
            preview: body_preview(exchange.body()),
        }
    }
}

/// Truncates a body to `PREVIEW_LIMIT` characters, marking the cut with `...`
pub fn body_preview(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let mut chars = body.char_indices();
    match chars.nth(PREVIEW_LIMIT) {
        Some((idx, _)) => Some(format!("{}...", &body[..idx])),
        None => Some(body.to_string()),
    }
}

/// Phase of the scan state machine a failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Init,
    Discovery,
    TraceOverride,
    OptionsOverride,
    /// The scan task itself died before producing a report
    Task,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::Init => write!(f, "init"),
            ScanPhase::Discovery => write!(f, "discovery"),
            ScanPhase::TraceOverride => write!(f, "trace-override"),
            ScanPhase::OptionsOverride => write!(f, "options-override"),
            ScanPhase::Task => write!(f, "scan task"),
        }
    }
}

/// Unrecovered failure of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub phase: ScanPhase,
    pub message: String,
}

/// Structured events emitted while scanning, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Started { url: String },
    /// OPTIONS answered with something other than 200
    DiscoveryStatus { status: u16 },
    OptionsAvailable { status: u16 },
    AllowedMethods { methods: Vec<String> },
    /// TRACE is already advertised, nothing left to smuggle
    TraceAlreadyAllowed { methods: Vec<String> },
    BatteryStarted { base_method: String, target_method: String },
    VulnerabilityFound(Evidence),
    NoVulnerability { summary: Vec<HeaderStatus> },
    Failed { phase: ScanPhase, message: String },
}

/// Everything one scan of one URL produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target as supplied by the caller
    pub target: String,
    /// Normalized URL, absent when the target could not be parsed
    pub url: Option<String>,
    pub scan_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub events: Vec<ScanEvent>,
    pub verdict: Option<ScanVerdict>,
    pub failure: Option<ScanFailure>,
    /// Requests dispatched by this scan
    pub requests_sent: u64,
}

impl ScanReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            url: None,
            scan_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            finished_at: None,
            events: Vec::new(),
            verdict: None,
            failure: None,
            requests_sent: 0,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.vulnerable)
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Records a failure and the matching event
    pub fn fail(&mut self, phase: ScanPhase, message: impl Into<String>) {
        let message = message.into();
        self.events.push(ScanEvent::Failed {
            phase,
            message: message.clone(),
        });
        self.failure = Some(ScanFailure { phase, message });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

/// Configuration for a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Single target URL or bare host
    pub target: Option<String>,
    /// File with one target per line
    pub target_list: Option<String>,
    /// Maximum number of URLs scanned at once
    pub concurrency: usize,
    /// Request timeout in seconds, applied to the full request/response cycle
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Idle connections kept per host in the shared pool
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
    /// Seconds an idle pooled connection is kept
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Redirect hops followed before giving up
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Output format (text or json)
    #[serde(default = "default_format")]
    pub format: String,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_max_idle_per_host() -> usize {
    10
}

fn default_idle_timeout() -> u64 {
    90
}

fn default_max_redirects() -> usize {
    10
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: None,
            target_list: None,
            concurrency: 5,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_idle_per_host: default_max_idle_per_host(),
            idle_timeout_secs: default_idle_timeout(),
            max_redirects: default_max_redirects(),
            format: default_format(),
        }
    }
}
