//! JSON Lines output: one scan report per line

use crate::error::Result;
use crate::models::ScanReport;
use std::io::Write;

/// Serializes a report as a single JSON line
pub fn to_line(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string(report)?)
}

/// Writes a report as one JSON line
pub fn write_line<W: Write>(writer: &mut W, report: &ScanReport) -> Result<()> {
    writeln!(writer, "{}", to_line(report)?)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanEvent, ScanPhase};

    #[test]
    fn test_line_is_tagged_json() {
        let mut report = ScanReport::new("example.com");
        report.fail(ScanPhase::Discovery, "connection refused");

        let mut buf = Vec::new();
        write_line(&mut buf, &report).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(text.trim()).expect("json");
        assert_eq!(value["target"], "example.com");
        assert_eq!(value["events"][0]["event"], "failed");
        assert_eq!(value["failure"]["phase"], "Discovery");

        let back: ScanReport = serde_json::from_str(text.trim()).expect("roundtrip");
        assert_eq!(
            back.events,
            vec![ScanEvent::Failed {
                phase: ScanPhase::Discovery,
                message: "connection refused".to_string()
            }]
        );
    }
}
