//! Scenario 3: Sensor Failure
//!
//! The same status question and oracle script as scenario 2, but the sensor
//! feed is down: no readings reach the environment analyzer. The provider
//! failure is absorbed. It is stored under `environment_error`, noted in the
//! audit trail, and the run still completes successfully.

use std::sync::Arc;

use plantmate_contracts::{error::PlantMateResult, execution::OrchestratorResult};
use plantmate_core::{OrchestratorConfig, RunRequest};
use plantmate_trace::InMemoryTraceWriter;

use crate::garden_orchestrator;

use super::plant_status::{status_oracle, QUERY};

/// Run Scenario 3: Sensor Failure.
pub async fn run_scenario() -> PlantMateResult<OrchestratorResult> {
    println!("=== Scenario 3: Sensor Failure ===");
    println!();
    println!("  Query:   \"{QUERY}\"");
    println!("  Sensors: (offline)");

    let orchestrator = garden_orchestrator(Arc::new(status_oracle()), OrchestratorConfig::default())?;
    let trace = InMemoryTraceWriter::new();

    let result = orchestrator.run_traced(RunRequest::new(QUERY), &trace).await;

    let degraded: Vec<&str> = result.degraded_capabilities().iter().map(|k| k.name()).collect();
    println!("  Degraded capabilities: [{}]", degraded.join(", "));
    super::report(&result, &trace)?;
    Ok(result)
}
