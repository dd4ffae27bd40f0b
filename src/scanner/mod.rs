//! Probe engine: OPTIONS discovery, override battery and verdict

pub mod battery;
pub mod classify;
pub mod discovery;

use crate::error::{ProbeError, Result};
use crate::http::Transport;
use crate::models::{
    Evidence, ExchangeResult, HeaderStatus, ScanEvent, ScanPhase, ScanReport, ScanVerdict,
    VulnClass,
};
use tracing::{debug, error, info};
use url::Url;

pub use battery::{try_overrides, OVERRIDE_HEADERS};
pub use classify::{is_vulnerable_options_override, is_vulnerable_trace};
pub use discovery::{discover, extract_allowed_methods, Discovery};

/// Runs the per-URL scan state machine over a transport.
///
/// One `scan` call sends its requests strictly in sequence and shares no
/// mutable state with other calls, so a single engine can serve concurrent
/// scans.
pub struct ProbeEngine<T: Transport> {
    transport: T,
}

impl<T: Transport> ProbeEngine<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Scans one target (bare host or absolute URL)
    pub async fn scan(&self, target: &str) -> ScanReport {
        let mut report = ScanReport::new(target);

        let url = match normalize_target(target) {
            Ok(url) => url,
            Err(e) => {
                error!("Rejected target '{target}': {e}");
                report.fail(ScanPhase::Init, e.to_string());
                report.finish();
                return report;
            }
        };

        info!("Scanning {url}");
        report.url = Some(url.clone());
        report.events.push(ScanEvent::Started { url: url.clone() });

        report.requests_sent += 1;
        let discovery = match discover(&self.transport, &url).await {
            Ok(d) => d,
            Err(e) => {
                error!("OPTIONS request to {url} failed: {e}");
                report.fail(ScanPhase::Discovery, format!("OPTIONS request failed: {e}"));
                report.finish();
                return report;
            }
        };

        if !discovery.is_ok() {
            info!("OPTIONS on {url} returned {}", discovery.status);
            report.events.push(ScanEvent::DiscoveryStatus {
                status: discovery.status,
            });
            self.options_override_check(&url, &mut report).await;
            report.finish();
            return report;
        }

        report.events.push(ScanEvent::OptionsAvailable {
            status: discovery.status,
        });

        if discovery.allowed_methods.is_empty() {
            error!("{url}: {}", ProbeError::InconclusiveDiscovery);
            report.fail(ScanPhase::Discovery, ProbeError::InconclusiveDiscovery.to_string());
            report.finish();
            return report;
        }

        let methods = discovery.allowed_methods;
        info!("{url} allows: {}", methods.join(", "));
        report.events.push(ScanEvent::AllowedMethods {
            methods: methods.clone(),
        });

        if discovery::allows(&methods, "TRACE") {
            info!("{url} already advertises TRACE, skipping override battery");
            report.events.push(ScanEvent::TraceAlreadyAllowed { methods });
            report.finish();
            return report;
        }

        let safe_base = if discovery::allows(&methods, "POST") {
            "POST"
        } else {
            "GET"
        };

        self.trace_override_check(&url, safe_base, &mut report).await;
        report.finish();
        report
    }

    /// TRACE smuggled through the safest allowed method
    async fn trace_override_check(&self, url: &str, safe_base: &str, report: &mut ScanReport) {
        self.run_battery(
            url,
            safe_base,
            "TRACE",
            VulnClass::TraceOverride,
            ScanPhase::TraceOverride,
            is_vulnerable_trace,
            report,
        )
        .await;
    }

    /// OPTIONS smuggled through GET after a direct OPTIONS was not accepted
    async fn options_override_check(&self, url: &str, report: &mut ScanReport) {
        self.run_battery(
            url,
            "GET",
            "OPTIONS",
            VulnClass::OptionsOverride,
            ScanPhase::OptionsOverride,
            is_vulnerable_options_override,
            report,
        )
        .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_battery(
        &self,
        url: &str,
        base_method: &str,
        target_method: &str,
        class: VulnClass,
        phase: ScanPhase,
        classifier: fn(&ExchangeResult) -> bool,
        report: &mut ScanReport,
    ) {
        info!("Testing {target_method} override via {base_method} on {url}");
        report.events.push(ScanEvent::BatteryStarted {
            base_method: base_method.to_string(),
            target_method: target_method.to_string(),
        });

        let battery = try_overrides(&self.transport, url, base_method, target_method).await;
        let outcome = match battery {
            Ok(outcome) => outcome,
            Err(e) => {
                if matches!(e, ProbeError::AllAttemptsFailed { .. }) {
                    report.requests_sent += OVERRIDE_HEADERS.len() as u64;
                }
                error!("Override battery on {url} failed: {e}");
                report.fail(phase, e.to_string());
                return;
            }
        };
        report.requests_sent += outcome.requests_sent;

        let verdict = classify_battery(
            base_method,
            target_method,
            class,
            outcome.results,
            classifier,
        );

        if verdict.vulnerable {
            for exchange in &verdict.triggering {
                info!(
                    "{url} honors {} for {target_method} via {base_method}",
                    exchange.override_header().unwrap_or("?")
                );
                let evidence =
                    Evidence::from_exchange(url, class, base_method, target_method, exchange);
                report.events.push(ScanEvent::VulnerabilityFound(evidence));
            }
        } else {
            debug!("No override honored on {url}");
            report.events.push(ScanEvent::NoVulnerability {
                summary: verdict.summary.clone(),
            });
        }

        report.verdict = Some(verdict);
    }
}

/// Builds a verdict from battery results. Every result that satisfies the
/// classifier is kept as evidence.
pub fn classify_battery(
    base_method: &str,
    target_method: &str,
    class: VulnClass,
    results: Vec<ExchangeResult>,
    classifier: fn(&ExchangeResult) -> bool,
) -> ScanVerdict {
    let summary = results
        .iter()
        .map(|r| HeaderStatus {
            header: r.override_header().unwrap_or_default().to_string(),
            status: r.status(),
        })
        .collect();

    let triggering: Vec<ExchangeResult> = results.into_iter().filter(|r| classifier(r)).collect();

    ScanVerdict {
        vulnerable: !triggering.is_empty(),
        class,
        base_method: base_method.to_string(),
        target_method: target_method.to_string(),
        triggering,
        summary,
    }
}

/// Trims the target and prefixes `https://` when no scheme is given. The
/// result must parse as an absolute URL with a host.
pub fn normalize_target(target: &str) -> Result<String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(ProbeError::InvalidInput("empty target".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&url)
        .map_err(|e| ProbeError::InvalidInput(format!("malformed URL '{url}': {e}")))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ProbeError::InvalidInput(format!("URL '{url}' has no host")));
    }

    Ok(url)
}
