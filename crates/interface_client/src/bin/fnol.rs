//! FNOL Claim Client - command line interface
//!
//! # Usage
//!
//! ```bash
//! # Check that the processing backend is up
//! fnol health
//!
//! # Stream a claim through the pipeline and keep the assembled result
//! fnol stream "Rear-ended at a light on Main St, bumper damage" --save
//!
//! # Inspect stored results
//! fnol list
//! fnol show CLM-2024-001
//! ```
//!
//! # Environment Variables
//!
//! * `FNOL_BACKEND_URL` - Processing backend (default: http://localhost:8000)
//! * `FNOL_STORAGE_DIR` - Directory of stored results (default: .fnol)
//! * `FNOL_STORAGE_KEY` - Storage key of the results document (default: fnol_claim_results)
//! * `FNOL_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `FNOL_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use core_kernel::{ClaimKey, HealthCheckable};
use domain_claims::{
    try_assemble_result, ClaimDisposition, ClaimProcessingResult, ClaimSubmission, ClaimSummary,
    StreamResult,
};
use infra_store::{ClaimResultStore, FileKeyValueStore};
use interface_client::{
    ClaimIntakeService, ClaimProcessor, ClientConfig, HttpClaimsBackend, LogFormat,
    TracingNotifier,
};

#[derive(Parser, Debug)]
#[command(name = "fnol")]
#[command(about = "Submit FNOL claims to the processing backend and inspect stored results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the backend URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Override the storage directory
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend answers
    Health,
    /// Submit a claim form
    Submit(SubmitArgs),
    /// Process free claim text and store the result
    Process { text: String },
    /// Stream free claim text through the pipeline, printing stages as they finish
    Stream {
        text: String,
        /// Store the assembled result once all stages have reported
        #[arg(long)]
        save: bool,
    },
    /// Show a stored result
    Show {
        id: String,
        /// Print the raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored results
    List,
    /// Remove a stored result
    Remove { id: String },
    /// Remove every stored result
    Clear,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    customer_id: String,
    /// Claim type code, e.g. auto_collision
    #[arg(long = "type")]
    claim_type: String,
    #[arg(long)]
    policy_number: String,
    #[arg(long)]
    amount: Decimal,
    /// Incident date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    location: String,
    #[arg(long)]
    police_report: Option<String>,
    #[arg(long)]
    injuries: bool,
    #[arg(long)]
    description: String,
}

impl From<SubmitArgs> for ClaimSubmission {
    fn from(args: SubmitArgs) -> Self {
        ClaimSubmission {
            customer_id: args.customer_id,
            claim_type: args.claim_type,
            policy_number: args.policy_number,
            amount: args.amount,
            date: args.date,
            location: args.location,
            police_report: args.police_report,
            injuries: args.injuries,
            description: args.description,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = load_config();
    if let Some(url) = cli.backend_url.clone() {
        config.backend_url = url;
    }
    if let Some(dir) = cli.storage_dir.clone() {
        config.storage_dir = dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }

    init_tracing(&config);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration from the environment, falling back to defaults
fn load_config() -> ClientConfig {
    ClientConfig::from_env().unwrap_or_else(|e| {
        eprintln!("warning: ignoring invalid FNOL_ configuration: {e}");
        ClientConfig {
            backend_url: std::env::var("FNOL_BACKEND_URL")
                .unwrap_or_else(|_| ClientConfig::default().backend_url),
            log_level: std::env::var("FNOL_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            ..Default::default()
        }
    })
}

/// Initializes the tracing subscriber; logs go to stderr so stdout stays clean
fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

async fn run(command: Command, config: ClientConfig) -> Result<ExitCode> {
    config.validate()?;

    match command {
        Command::Health => health(&config).await,
        Command::Submit(args) => submit(&config, args.into()).await,
        Command::Process { text } => process(&config, &text).await,
        Command::Stream { text, save } => stream(&config, &text, save).await,
        Command::Show { id, json } => show(&config, &id, json).await,
        Command::List => list(&config).await,
        Command::Remove { id } => remove(&config, &id).await,
        Command::Clear => {
            open_store(&config).await.clear().await?;
            println!("Cleared all stored claim results");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn backend(config: &ClientConfig) -> Result<Arc<HttpClaimsBackend>> {
    Ok(Arc::new(
        HttpClaimsBackend::new(config.clone()).context("create backend client")?,
    ))
}

async fn open_store(config: &ClientConfig) -> Arc<ClaimResultStore> {
    let adapter = Arc::new(FileKeyValueStore::new(&config.storage_dir));
    Arc::new(ClaimResultStore::with_key(adapter, config.storage_key.clone()).await)
}

async fn intake(config: &ClientConfig) -> Result<ClaimIntakeService> {
    Ok(ClaimIntakeService::new(
        backend(config)?,
        open_store(config).await,
        Arc::new(TracingNotifier),
    ))
}

async fn health(config: &ClientConfig) -> Result<ExitCode> {
    let result = backend(config)?.health_check().await;
    if result.is_healthy() {
        println!("connected to {} ({} ms)", config.backend_url, result.latency_ms);
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "backend {} is {:?}: {}",
            config.backend_url,
            result.status,
            result.message.unwrap_or_default()
        );
        Ok(ExitCode::FAILURE)
    }
}

async fn submit(config: &ClientConfig, submission: ClaimSubmission) -> Result<ExitCode> {
    let service = intake(config).await?;
    match service.submit(&submission).await {
        Ok(outcome) => {
            print_summary(&outcome.summary);
            print_result(&outcome.result);
            if !outcome.persisted {
                println!("warning: result was not saved");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let key = ClaimKey::generate();
            let summary = ClaimSummary::manual_review(key, &submission, Utc::now().date_naive());
            println!("Backend processing failed: {e}");
            print_summary(&summary);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn process(config: &ClientConfig, text: &str) -> Result<ExitCode> {
    let outcome = intake(config).await?.submit_text(text).await?;
    print_summary(&outcome.summary);
    print_result(&outcome.result);
    Ok(ExitCode::SUCCESS)
}

async fn stream(config: &ClientConfig, text: &str, save: bool) -> Result<ExitCode> {
    let processor = Arc::new(ClaimProcessor::new(backend(config)?, Arc::new(TracingNotifier)));

    let mut updates = processor.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.results.len() < printed {
                printed = 0;
            }
            for event in &snapshot.results[printed..] {
                print_stage(event);
            }
            printed = snapshot.results.len();
        }
    });

    let outcome = processor.process_claim(text).await;
    let snapshot = processor.snapshot();
    drop(processor);
    let _ = printer.await;

    let summary = outcome?;
    println!(
        "{} events, {} skipped lines, stages: {}",
        summary.events,
        summary.skipped_lines,
        summary.completed_nodes.join(", ")
    );

    if save {
        let result = try_assemble_result(&snapshot.results)?;
        let key = result.claim_key().unwrap_or_else(ClaimKey::generate);
        open_store(config).await.set(key.clone(), result).await?;
        println!("Saved as {key}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn show(config: &ClientConfig, id: &str, json: bool) -> Result<ExitCode> {
    let store = open_store(config).await;
    match store.lookup(id).await? {
        Some(result) if json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(result) => {
            println!("Claim {}", id.trim());
            print_result(&result);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("Claim {} not found", id.trim());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn list(config: &ClientConfig) -> Result<ExitCode> {
    let entries = open_store(config).await.entries().await;
    if entries.is_empty() {
        println!("No stored claim results");
    }
    for (key, result) in entries {
        let level = result.risk_level();
        println!(
            "{key:<20} {:<18} {:>12} {:<6} {:<8} {}",
            result.claim.claim_type,
            result.claim.amount,
            level,
            ClaimDisposition::from_risk(level),
            result.routing_decision.processing_path
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn remove(config: &ClientConfig, id: &str) -> Result<ExitCode> {
    match open_store(config).await.remove(id).await? {
        Some(_) => {
            println!("Removed {}", id.trim());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("Claim {} not found", id.trim());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_stage(event: &StreamResult) {
    println!("[{}] {} completed", event.stage(), event.node);
}

fn print_summary(summary: &ClaimSummary) {
    println!(
        "{} {} ${} risk {} -> {}",
        summary.claim_id, summary.claim_type, summary.amount, summary.risk_level, summary.status
    );
}

fn print_result(result: &ClaimProcessingResult) {
    let claim = &result.claim;
    println!("  type:      {}", claim.claim_type);
    println!("  customer:  {}", claim.customer_id);
    println!("  policy:    {}", claim.policy_number);
    println!("  amount:    ${}", claim.amount);
    println!("  incident:  {} at {}", claim.date, claim.incident_location);
    println!(
        "  risk:      {} ({}, score {})",
        result.risk_level(),
        result.risk_report.category,
        result.risk_report.risk_score
    );
    for reason in &result.risk_report.reasons {
        println!("             - {reason}");
    }
    println!(
        "  routing:   {} / {} priority / {}",
        result.routing_decision.processing_path,
        result.routing_decision.priority,
        result.routing_decision.adjuster_tier
    );
    if !result.routing_decision.rationale.is_empty() {
        println!("  rationale: {}", result.routing_decision.rationale);
    }
    for line in &result.logs {
        println!("  log:       {line}");
    }
}
