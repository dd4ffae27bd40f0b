//! Rendering-agnostic messages built from scan events

use crate::models::{Evidence, ScanEvent};

/// How a message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
    Vulnerable,
}

/// A presentation-neutral message: a headline, optional labelled details,
/// an optional list of plain lines and an optional body preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub headline: String,
    pub details: Vec<(String, String)>,
    pub lines: Vec<String>,
    pub preview: Option<String>,
}

impl Message {
    fn new(level: Level, headline: impl Into<String>) -> Self {
        Self {
            level,
            headline: headline.into(),
            details: Vec::new(),
            lines: Vec::new(),
            preview: None,
        }
    }

    fn detail(mut self, label: &str, value: impl ToString) -> Self {
        self.details.push((label.to_string(), value.to_string()));
        self
    }

    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// Turns one event into a message. Pure: holds no formatting state.
pub fn render(event: &ScanEvent) -> Message {
    match event {
        ScanEvent::Started { url } => Message::new(Level::Info, format!("Target: {url}")),
        ScanEvent::DiscoveryStatus { status } => {
            Message::new(Level::Info, format!("OPTIONS returned status {status}"))
        }
        ScanEvent::OptionsAvailable { status } => Message::new(
            Level::Success,
            format!("OPTIONS method available (status {status})"),
        ),
        ScanEvent::AllowedMethods { methods } => Message::new(
            Level::Success,
            format!("Allowed methods: {}", methods.join(", ")),
        ),
        ScanEvent::TraceAlreadyAllowed { .. } => Message::new(
            Level::Info,
            "TRACE is already allowed directly, override testing skipped",
        ),
        ScanEvent::BatteryStarted {
            base_method,
            target_method,
        } => Message::new(Level::Info, "Testing HTTP method override")
            .line(format!("Base method: {base_method}"))
            .line(format!("Override method: {target_method}")),
        ScanEvent::VulnerabilityFound(evidence) => render_evidence(evidence),
        ScanEvent::NoVulnerability { summary } => {
            let mut msg = Message::new(Level::Success, "No method override vulnerability found")
                .line("Results by header:");
            for entry in summary {
                msg = msg.line(format!("- {}: {}", entry.header, entry.status));
            }
            msg
        }
        ScanEvent::Failed { phase, message } => {
            Message::new(Level::Error, format!("{phase} failed: {message}"))
        }
    }
}

fn render_evidence(evidence: &Evidence) -> Message {
    let mut msg = Message::new(
        Level::Vulnerable,
        format!("HTTP method override vulnerability found ({})", evidence.class),
    )
    .detail("URL", &evidence.url)
    .detail("Base method", &evidence.base_method)
    .detail("Target method", &evidence.target_method)
    .detail("Override header", &evidence.override_header)
    .detail("Status", evidence.status)
    .detail("Content-Type", &evidence.content_type)
    .detail("Length", evidence.response_length);
    msg.preview = evidence.preview.clone();
    msg
}
