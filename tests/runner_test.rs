//! Batch orchestration and configuration file tests

mod common;

use async_trait::async_trait;
use common::{test_config, Reply, StubTransport};
use reqwest::Method;
use std::io::Write;
use std::sync::Arc;
use verbtunnel::config;
use verbtunnel::error::{ProbeError, Result};
use verbtunnel::http::{HttpClient, Transport};
use verbtunnel::models::{ExchangeResult, HeaderTable, ScanPhase};
use verbtunnel::runner;
use verbtunnel::scanner::ProbeEngine;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_batch_keeps_input_order_and_isolates_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(header("X-Original-HTTP-Method", "OPTIONS"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let closed = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let unreachable = format!("http://{}", closed.local_addr().expect("addr"));
    drop(closed);

    let config = test_config(&mock_server.uri());
    let engine = Arc::new(ProbeEngine::new(
        HttpClient::from_config(&config).expect("client"),
    ));

    let targets = vec![
        mock_server.uri(),
        unreachable.clone(),
        format!("{}/second", mock_server.uri()),
    ];

    let mut seen = 0;
    let reports = runner::scan_all(engine, targets, 2, |_| seen += 1)
        .await
        .expect("batch");

    assert_eq!(seen, 3);
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].target, mock_server.uri());
    assert_eq!(reports[1].target, unreachable);
    assert!(reports[0].is_vulnerable());
    assert!(reports[1].is_failed());
    assert!(!reports[2].is_failed());
    assert!(reports[2].is_vulnerable());
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected_before_scanning() {
    let engine = Arc::new(ProbeEngine::new(StubTransport::new(
        Reply::status(200),
        Reply::status(200),
    )));

    let result = runner::scan_all(
        Arc::clone(&engine),
        vec!["example.com".to_string()],
        0,
        |_| {},
    )
    .await;

    assert!(matches!(result, Err(ProbeError::InvalidInput(_))));
    assert!(engine.transport().calls().is_empty());
}

#[tokio::test]
async fn test_concurrency_one_scans_everything() {
    let engine = Arc::new(ProbeEngine::new(StubTransport::new(
        Reply::with_headers(200, HeaderTable::new().with("Allow", "GET, TRACE")),
        Reply::status(200),
    )));

    let targets: Vec<String> = (0..5).map(|i| format!("host{i}.test")).collect();
    let reports = runner::scan_all(Arc::clone(&engine), targets, 1, |_| {})
        .await
        .expect("batch");

    assert_eq!(reports.len(), 5);
    assert_eq!(engine.transport().calls().len(), 5);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.url.as_deref(), Some(format!("https://host{i}.test").as_str()));
    }
}

/// Answers 404 everywhere except hosts named `bad.test`, where it panics
struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    async fn send(
        &self,
        _method: Method,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<ExchangeResult> {
        if url.contains("bad.test") {
            panic!("transport blew up on {url}");
        }
        Ok(ExchangeResult::new(404, HeaderTable::new(), ""))
    }
}

#[tokio::test]
async fn test_panicked_scan_is_reported_as_failed() {
    let engine = Arc::new(ProbeEngine::new(PanickingTransport));
    let targets = vec![
        "a.test".to_string(),
        "bad.test".to_string(),
        "c.test".to_string(),
    ];

    let mut seen = Vec::new();
    let reports = runner::scan_all(engine, targets, 2, |r| seen.push(r.target.clone()))
        .await
        .expect("batch");

    assert_eq!(reports.len(), 3);
    assert_eq!(seen.len(), 3);
    assert!(seen.contains(&"bad.test".to_string()));

    assert_eq!(reports[0].target, "a.test");
    assert_eq!(reports[1].target, "bad.test");
    assert_eq!(reports[2].target, "c.test");

    assert!(reports[1].is_failed());
    assert!(reports[1].finished_at.is_some());
    let failure = reports[1].failure.as_ref().expect("failure");
    assert_eq!(failure.phase, ScanPhase::Task);

    for report in [&reports[0], &reports[2]] {
        assert!(!report.is_failed(), "{:?}", report.failure);
        assert!(report.verdict.is_some());
    }
}

#[test]
fn test_read_targets_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "example.com\n\n  https://a.test  \n").expect("write");

    let targets = runner::read_targets(file.path()).expect("read");
    assert_eq!(targets, vec!["example.com", "https://a.test"]);
}

#[test]
fn test_missing_target_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = runner::read_targets(&dir.path().join("missing.txt"));
    assert!(matches!(result, Err(ProbeError::IoError(_))));
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "[scan]\nconcurrency = 8\ntimeout_secs = 4\nuser_agent = \"Mozilla/5.0 test\"\n"
    )
    .expect("write");

    let config = config::load_config(file.path()).expect("config");
    assert_eq!(config.concurrency, 8);
    assert_eq!(config.timeout_secs, 4);
    assert_eq!(config.user_agent, "Mozilla/5.0 test");
    assert_eq!(config.format, "text");
}
