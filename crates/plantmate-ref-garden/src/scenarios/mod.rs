//! Garden reference runtime demo scenarios.
//!
//! Each scenario wires real PlantMate components (orchestrator, reference
//! providers, decision verifier, hash-chained trace) to a scripted oracle and
//! demonstrates one path through the workflow.

use plantmate_contracts::{
    error::{PlantMateError, PlantMateResult},
    execution::OrchestratorResult,
};
use plantmate_trace::InMemoryTraceWriter;

pub mod greeting;
pub mod plant_status;
pub mod sensor_failure;
pub mod stubborn_oracle;

/// Print the parts of a result every scenario shows, then check the trace.
pub(crate) fn report(result: &OrchestratorResult, trace: &InMemoryTraceWriter) -> PlantMateResult<()> {
    let log = trace.export_log()?;

    println!("  Success:        {}", result.success);
    println!("  Query type:     {}", result.query_analysis.query_type);
    println!("  Iterations:     {}", result.query_analysis.iterations);
    println!("  Workflow path:  {}", result.workflow_path);
    println!("  Node path:      {}", log.path().join(" -> "));
    for (key, value) in result.tool_results.iter() {
        println!("  Result [{key}]: {value}");
    }
    println!("  Reasoning:      {}", result.reasoning);

    if !trace.verify_integrity() {
        return Err(PlantMateError::TraceWriteFailed {
            reason: "step trace failed hash-chain verification".to_string(),
        });
    }
    println!(
        "  Trace:          {} events, chain VALID (terminal {})",
        log.events.len(),
        &log.terminal_hash[..log.terminal_hash.len().min(16)]
    );
    println!();
    Ok(())
}

/// Run all four scenarios in order.
pub async fn run_all() -> PlantMateResult<Vec<OrchestratorResult>> {
    Ok(vec![
        greeting::run_scenario().await?,
        plant_status::run_scenario().await?,
        sensor_failure::run_scenario().await?,
        stubborn_oracle::run_scenario().await?,
    ])
}
