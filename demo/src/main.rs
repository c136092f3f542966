//! PlantMate Garden Reference Runtime: Demo CLI
//!
//! Runs one or all of the four garden scenarios, or answers a single question
//! with the offline keyword-rule oracle and the reference providers.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- greeting
//!   cargo run -p demo -- plant-status
//!   cargo run -p demo -- sensor-failure
//!   cargo run -p demo -- stubborn-oracle
//!   cargo run -p demo -- ask "why are my fern's leaves yellow?" \
//!       --sensors '{"temperature": 16, "humidity": 28}'

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plantmate_contracts::error::{PlantMateError, PlantMateResult};
use plantmate_core::{OrchestratorConfig, RunRequest};
use plantmate_ref_garden::{
    garden_orchestrator, garden_rule_oracle,
    scenarios::{self, greeting, plant_status, sensor_failure, stubborn_oracle},
};
use plantmate_rules::RuleOracle;
use plantmate_trace::InMemoryTraceWriter;

// ── CLI definition ────────────────────────────────────────────────────────────

/// PlantMate: bounded tool orchestration for a plant-care assistant.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "PlantMate garden reference runtime demo",
    long_about = "Runs PlantMate orchestration scenarios showing tool selection,\n\
                  provider failure handling, the iteration ceiling, and trace integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four garden scenarios in sequence.
    RunAll,
    /// Scenario 1: a greeting that needs no tools.
    Greeting,
    /// Scenario 2: a status question answered from sensor readings.
    PlantStatus,
    /// Scenario 3: the sensor feed is down; the run still succeeds.
    SensorFailure,
    /// Scenario 4: an oracle that is never satisfied hits the iteration ceiling.
    StubbornOracle,
    /// Answer one question with the keyword-rule oracle.
    Ask {
        /// The user's question.
        query: String,
        /// Orchestrator configuration TOML.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Keyword rule TOML; defaults to the bundled garden rules.
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Live sensor readings as a JSON object.
        #[arg(long)]
        sensors: Option<String>,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug to see every workflow step.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            scenarios::run_all().await.map(|_| ())
        }
        Command::Greeting => {
            print_banner();
            greeting::run_scenario().await.map(|_| ())
        }
        Command::PlantStatus => {
            print_banner();
            plant_status::run_scenario().await.map(|_| ())
        }
        Command::SensorFailure => {
            print_banner();
            sensor_failure::run_scenario().await.map(|_| ())
        }
        Command::StubbornOracle => {
            print_banner();
            stubborn_oracle::run_scenario().await.map(|_| ())
        }
        Command::Ask {
            query,
            config,
            rules,
            sensors,
            json,
        } => ask(query, config, rules, sensors, json).await,
    };

    if let Err(e) = result {
        eprintln!("Demo error: {e}");
        std::process::exit(1);
    }
}

// ── Single question ───────────────────────────────────────────────────────────

async fn ask(
    query: String,
    config: Option<PathBuf>,
    rules: Option<PathBuf>,
    sensors: Option<String>,
    json: bool,
) -> PlantMateResult<()> {
    let config = match config {
        Some(path) => OrchestratorConfig::from_file(&path)?,
        None => OrchestratorConfig::default(),
    };
    let oracle = match rules {
        Some(path) => RuleOracle::from_file(&path)?,
        None => garden_rule_oracle()?,
    };

    let mut request = RunRequest::new(query);
    if let Some(raw) = sensors {
        let readings = serde_json::from_str(&raw).map_err(|e| PlantMateError::ConfigError {
            reason: format!("--sensors is not valid JSON: {e}"),
        })?;
        request = request.with_aux_data(readings);
    }

    let orchestrator = garden_orchestrator(Arc::new(oracle), config)?;
    info!(tools = ?orchestrator.available_tools().keys().collect::<Vec<_>>(), "orchestrator ready");

    let trace = InMemoryTraceWriter::new();
    let result = orchestrator.run_traced(request, &trace).await;

    if json {
        let text = serde_json::to_string_pretty(&result).map_err(|e| PlantMateError::ConfigError {
            reason: format!("result is not serializable: {e}"),
        })?;
        println!("{text}");
    } else {
        println!("Success:       {}", result.success);
        println!("Query type:    {}", result.query_analysis.query_type);
        println!("Workflow path: {}", result.workflow_path);
        println!("Reasoning:     {}", result.reasoning);
        for (key, value) in result.tool_results.iter() {
            println!("[{key}] {value}");
        }
        println!(
            "Trace:         {} events, chain {}",
            trace.len(),
            if trace.verify_integrity() { "VALID" } else { "BROKEN" }
        );
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("PlantMate: Bounded Tool Orchestration");
    println!("Garden Reference Demo");
    println!("=====================================");
    println!();
    println!("Workflow per question:");
    println!("  [1] Initial analysis decides whether any tool is needed");
    println!("  [2] Tool selection picks one uncollected capability (or evaluate)");
    println!("  [3] The capability runs; a failure is recorded, never fatal");
    println!("  [4] Completeness check loops back to [2] or finishes");
    println!("  [5] Every node visit is written to a SHA-256 hash-chained trace");
    println!();
}
