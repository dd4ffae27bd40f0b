//! Colored terminal output

use super::message::{render, Level, Message};
use crate::models::ScanReport;
use colored::Colorize;
use std::fmt::Write;

/// Formats a message for a terminal, one or more lines without a trailing newline
pub fn format_message(msg: &Message) -> String {
    let mut out = String::new();

    let _ = match msg.level {
        Level::Info => write!(out, "{}", format!("[*] {}", msg.headline).blue()),
        Level::Success => write!(out, "{}", format!("[+] {}", msg.headline).green()),
        Level::Error => write!(out, "{}", format!("[-] {}", msg.headline).red()),
        Level::Vulnerable => write!(
            out,
            "\n{}",
            format!("[!] {}", msg.headline).white().on_red().bold()
        ),
    };

    for line in &msg.lines {
        let _ = write!(out, "\n    {line}");
    }

    if !msg.details.is_empty() {
        let _ = write!(out, "\n\n{}", "Details:".yellow().bold());
        for (label, value) in &msg.details {
            let _ = write!(
                out,
                "\n    {} : {}",
                format!("{label:<15}").cyan(),
                value.yellow()
            );
        }
    }

    if let Some(ref preview) = msg.preview {
        let _ = write!(
            out,
            "\n\n{}\n{}",
            "Response preview:".yellow().bold(),
            preview.cyan()
        );
    }

    out
}

/// Renders every event of a report
pub fn format_report(report: &ScanReport) -> String {
    report
        .events
        .iter()
        .map(|event| format_message(&render(event)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints every event of a report to stdout
pub fn print_report(report: &ScanReport) {
    println!("{}", format_report(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanEvent;

    #[test]
    fn test_format_report_keeps_event_order() {
        let mut report = ScanReport::new("example.com");
        report.events.push(ScanEvent::Started {
            url: "https://example.com".to_string(),
        });
        report.events.push(ScanEvent::DiscoveryStatus { status: 403 });

        let text = format_report(&report);
        let target = text.find("Target: https://example.com").expect("target line");
        let status = text.find("OPTIONS returned status 403").expect("status line");
        assert!(target < status);
    }
}
