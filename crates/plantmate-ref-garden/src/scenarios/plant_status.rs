//! Scenario 2: Plant Status
//!
//! A status question with live sensor readings attached as `aux_data`.
//!
//!   1. Initial analysis: tools needed
//!   2. Tool selection: environment
//!   3. Environment analyzer scores the readings
//!   4. Completeness check: complete
//!   5. Final compilation after one iteration

use std::sync::Arc;

use plantmate_contracts::{
    decision::DecisionKind, error::PlantMateResult, execution::OrchestratorResult,
};
use plantmate_core::{OrchestratorConfig, RunRequest};
use plantmate_trace::InMemoryTraceWriter;

use crate::{garden_orchestrator, mock_data::healthy_readings, oracle::ScriptedOracle};

pub const QUERY: &str = "How is my plant doing right now?";

pub(crate) fn status_oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .script(
            DecisionKind::InitialAnalysis,
            [r#"{"needs_tools": true, "reasoning": "asks about the current plant condition", "complexity": "simple"}"#],
        )
        .script(
            DecisionKind::ToolSelection,
            [r#"```json
{"next_tool": "environment", "reasoning": "current readings answer a status question"}
```"#],
        )
        .script(
            DecisionKind::CompletenessCheck,
            [r#"{"is_complete": true, "confidence": 0.85}"#],
        )
}

/// Run Scenario 2: Plant Status.
pub async fn run_scenario() -> PlantMateResult<OrchestratorResult> {
    println!("=== Scenario 2: Plant Status ===");
    println!();
    println!("  Query:   \"{QUERY}\"");
    println!("  Sensors: {}", healthy_readings());

    let orchestrator = garden_orchestrator(Arc::new(status_oracle()), OrchestratorConfig::default())?;
    let trace = InMemoryTraceWriter::new();
    let request = RunRequest::new(QUERY).with_aux_data(healthy_readings());

    let result = orchestrator.run_traced(request, &trace).await;

    if let Some(env) = result.tool_results.get("environment") {
        println!(
            "  Health:  {} ({})",
            env["health_score"], env["overall_status"].as_str().unwrap_or("?")
        );
    }
    super::report(&result, &trace)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::run_scenario;

    #[tokio::test]
    async fn test_plant_status_scenario() {
        let result = run_scenario().await.unwrap();
        assert!(result.success);
        assert_eq!(result.query_analysis.iterations, 1);
        assert_eq!(result.tool_results.keys().collect::<Vec<_>>(), vec!["environment"]);
        assert_eq!(result.tool_results.get("environment").unwrap()["overall_status"], "excellent");
        assert!(result.reasoning.contains("completeness: 0.85"));
    }
}
