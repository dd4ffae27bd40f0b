//! verbtunnel - HTTP method override scanner CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::error;
use tracing_subscriber::EnvFilter;

use verbtunnel::config;
use verbtunnel::error::ProbeError;
use verbtunnel::http::HttpClient;
use verbtunnel::models::{ScanConfig, ScanEvent, ScanReport};
use verbtunnel::report;
use verbtunnel::runner;
use verbtunnel::scanner::{ProbeEngine, OVERRIDE_HEADERS};

/// verbtunnel - detects HTTP method override (verb tunneling) vulnerabilities
#[derive(Parser)]
#[command(name = "verbtunnel", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one URL or a list of URLs
    Scan {
        /// Target URL or bare host (https:// is assumed)
        #[arg(short = 'u', long, conflicts_with = "list")]
        url: Option<String>,

        /// File with one target per line
        #[arg(short = 'l', long)]
        list: Option<PathBuf>,

        /// Number of URLs scanned concurrently
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,

        /// Request timeout in seconds
        #[arg(short = 't', long)]
        timeout: Option<u64>,

        /// Output format (text or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exit with code 1 if any target is vulnerable
        #[arg(long)]
        fail_on_vulnerable: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the override headers tried, in priority order
    Headers,
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  VERBTUNNEL v0.1.0                    ║
    ║  HTTP Method Override Scanner         ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn outcome_label(report: &ScanReport) -> String {
    if let Some(ref failure) = report.failure {
        return format!("FAILED ({})", failure.phase);
    }
    if let Some(ref verdict) = report.verdict {
        return if verdict.vulnerable {
            format!("VULNERABLE ({})", verdict.class)
        } else {
            "not vulnerable".to_string()
        };
    }
    if report
        .events
        .iter()
        .any(|e| matches!(e, ScanEvent::TraceAlreadyAllowed { .. }))
    {
        return "TRACE allowed directly".to_string();
    }
    "no verdict".to_string()
}

fn print_summary(reports: &[ScanReport]) {
    println!("\n{}", "  Scan Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut builder = Builder::default();
    builder.push_record(["Target", "Outcome", "Requests"]);
    for r in reports {
        builder.push_record([
            r.url.clone().unwrap_or_else(|| r.target.clone()),
            outcome_label(r),
            r.requests_sent.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    let vulnerable = reports.iter().filter(|r| r.is_vulnerable()).count();
    let failed = reports.iter().filter(|r| r.is_failed()).count();
    println!(
        "\n  {} {} {}",
        format!("{vulnerable} Vulnerable").red().bold(),
        format!("{failed} Failed").yellow(),
        format!("{} Total", reports.len()).white(),
    );
}

fn emit(report: &ScanReport, json: bool) {
    if json {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = report::json::write_line(&mut lock, report) {
            error!("Could not write report for {}: {e}", report.target);
        }
    } else {
        report::terminal::print_report(report);
        println!();
    }
}

fn resolve_config(path: Option<&Path>) -> Result<ScanConfig, ProbeError> {
    match path {
        Some(p) => config::load_config(p),
        None => {
            let default_path = Path::new(config::DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                config::load_config(default_path)
            } else {
                Ok(ScanConfig::default())
            }
        }
    }
}

fn exit_invalid(err: &ProbeError) -> ! {
    eprintln!("  {} {err}", "Error:".red().bold());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            url,
            list,
            concurrency,
            timeout,
            format,
            config: config_path,
            fail_on_vulnerable,
            verbose,
        } => {
            let filter = if verbose {
                "verbtunnel=debug"
            } else {
                "verbtunnel=info"
            };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
                )
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();

            let mut scan_config = resolve_config(config_path.as_deref())?;
            config::merge_cli_args(
                &mut scan_config,
                url,
                list.map(|p| p.display().to_string()),
                concurrency,
                timeout,
                format,
            );
            if let Err(e) = scan_config.validate() {
                exit_invalid(&e);
            }

            let json = scan_config.format == "json";
            let targets = if let Some(ref target) = scan_config.target {
                vec![target.clone()]
            } else if let Some(ref path) = scan_config.target_list {
                runner::read_targets(Path::new(path))?
            } else {
                Vec::new()
            };
            if targets.is_empty() {
                exit_invalid(&ProbeError::InvalidInput(
                    "target list contains no URLs".to_string(),
                ));
            }

            if !json {
                print_banner();
                println!(
                    "  {} {}",
                    "Targets:".bold(),
                    targets.len().to_string().green()
                );
                println!(
                    "  {} {}\n",
                    "Concurrency:".bold(),
                    scan_config.concurrency.to_string().cyan()
                );
            }

            let client = HttpClient::from_config(&scan_config)?;
            let engine = Arc::new(ProbeEngine::new(client));

            let reports = if targets.len() == 1 {
                let report = engine.scan(&targets[0]).await;
                emit(&report, json);
                vec![report]
            } else {
                let pb = if json {
                    ProgressBar::hidden()
                } else {
                    let pb = ProgressBar::new(targets.len() as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("=>-"),
                    );
                    pb
                };

                let reports = runner::scan_all(
                    Arc::clone(&engine),
                    targets,
                    scan_config.concurrency,
                    |report| {
                        pb.suspend(|| emit(report, json));
                        pb.inc(1);
                    },
                )
                .await?;
                pb.finish_with_message("Scan complete");
                reports
            };

            if !json {
                print_summary(&reports);
                println!(
                    "\n  {} {}",
                    "Requests sent:".bold(),
                    engine.transport().request_count().to_string().cyan()
                );
            }

            let any_failed = reports.iter().any(ScanReport::is_failed);
            let any_vulnerable = reports.iter().any(ScanReport::is_vulnerable);
            if any_failed || (fail_on_vulnerable && any_vulnerable) {
                std::process::exit(1);
            }
        }

        Commands::Headers => {
            print_banner();
            println!("  {}\n", "Override headers (priority order):".bold());
            for (i, header) in OVERRIDE_HEADERS.iter().enumerate() {
                println!("    {} {}", format!("{:>2}.", i + 1).cyan().bold(), header);
            }
            println!();
        }
    }

    Ok(())
}
