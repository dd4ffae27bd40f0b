//! Batch orchestration: target lists and bounded concurrent scans

use crate::error::{ProbeError, Result};
use crate::http::Transport;
use crate::models::{ScanPhase, ScanReport};
use crate::scanner::ProbeEngine;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

/// Reads one target per line, skipping blank lines
pub fn read_targets(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_targets(&content))
}

/// Splits newline-delimited targets, trimming and skipping blank lines
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Scans every target with at most `concurrency` scans in flight.
///
/// `on_report` is called as each scan completes. The returned reports are in
/// input order. A scan task that panics or is cancelled still yields a
/// failed report for its target.
pub async fn scan_all<T, F>(
    engine: Arc<ProbeEngine<T>>,
    targets: Vec<String>,
    concurrency: usize,
    mut on_report: F,
) -> Result<Vec<ScanReport>>
where
    T: Transport + 'static,
    F: FnMut(&ScanReport),
{
    if concurrency == 0 {
        return Err(ProbeError::InvalidInput(
            "concurrency must be greater than 0".to_string(),
        ));
    }

    info!(
        "Scanning {} targets with concurrency {concurrency}",
        targets.len()
    );

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut set = JoinSet::new();
    let mut reports = Vec::with_capacity(targets.len());
    let mut pending = BTreeMap::new();

    for (index, target) in targets.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ProbeError::InvalidInput("scan admission gate closed".to_string()))?;
        let engine = Arc::clone(&engine);
        pending.insert(index, target.clone());

        set.spawn(async move {
            let report = engine.scan(&target).await;
            drop(permit);
            (index, report)
        });

        while let Some(joined) = set.try_join_next() {
            collect(joined, &mut on_report, &mut reports, &mut pending);
        }
    }

    while let Some(joined) = set.join_next().await {
        collect(joined, &mut on_report, &mut reports, &mut pending);
    }

    for (index, target) in pending {
        let mut report = ScanReport::new(target);
        report.fail(ScanPhase::Task, "scan task panicked or was cancelled before reporting");
        report.finish();
        on_report(&report);
        reports.push((index, report));
    }

    reports.sort_by_key(|(index, _)| *index);
    Ok(reports.into_iter().map(|(_, report)| report).collect())
}

fn collect<F: FnMut(&ScanReport)>(
    joined: std::result::Result<(usize, ScanReport), JoinError>,
    on_report: &mut F,
    reports: &mut Vec<(usize, ScanReport)>,
    pending: &mut BTreeMap<usize, String>,
) {
    match joined {
        Ok((index, report)) => {
            pending.remove(&index);
            on_report(&report);
            reports.push((index, report));
        }
        Err(e) => {
            error!("Scan task did not complete: {e}");
        }
    }
}
