//! Result compilation: packs a finished run into `OrchestratorResult`.

use serde_json::Value;

use plantmate_contracts::{
    capability::{CapabilityKind, ToolResults},
    error::PlantMateError,
    execution::{OrchestrationState, OrchestratorResult, QueryAnalysisSummary},
};

/// Build the result of a run that reached a terminal node.
///
/// `confidence` is a fixed constant; nothing in the run computes it.
pub fn compile(state: &OrchestrationState, confidence: f64) -> OrchestratorResult {
    let tools = tools_invoked(&state.tool_results);
    OrchestratorResult {
        success: true,
        query_analysis: QueryAnalysisSummary {
            query_type: state.analysis.complexity.as_str().to_string(),
            tools_needed: tools.clone(),
            reasoning: state.reasoning.clone(),
            confidence,
            iterations: state.iteration_count,
        },
        tool_results: state.tool_results.clone(),
        reasoning: state.reasoning.clone(),
        workflow_path: workflow_path(state.iteration_count, &tools),
    }
}

/// Build the result of an aborted run.
pub fn compile_failure(error: &PlantMateError) -> OrchestratorResult {
    let message = error.to_string();
    let mut tool_results = ToolResults::new();
    tool_results.insert("error", Value::String(message.clone()));

    OrchestratorResult {
        success: false,
        query_analysis: QueryAnalysisSummary {
            query_type: "error".to_string(),
            tools_needed: Vec::new(),
            reasoning: format!("error: {message}"),
            confidence: 0.0,
            iterations: 0,
        },
        tool_results,
        reasoning: format!("workflow aborted: {message}"),
        workflow_path: "aborted".to_string(),
    }
}

/// Capability names in execution order, with error keys folded onto their
/// capability.
fn tools_invoked(results: &ToolResults) -> Vec<String> {
    results
        .attempted_capabilities()
        .into_iter()
        .map(|kind: CapabilityKind| kind.name().to_string())
        .collect()
}

fn workflow_path(iterations: u32, tools: &[String]) -> String {
    format!("iterations={iterations}, tools=[{}]", tools.join(", "))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use plantmate_contracts::{
        capability::CapabilityKind,
        decision::{Complexity, QueryAnalysis},
        error::PlantMateError,
        execution::OrchestrationState,
    };

    use super::{compile, compile_failure};

    #[test]
    fn compiles_tools_in_execution_order() {
        let mut state = OrchestrationState::new("q", vec![], None);
        state.analysis = QueryAnalysis {
            needs_tools: true,
            reasoning: String::new(),
            complexity: Complexity::Complex,
        };
        state.tool_results.record_success(CapabilityKind::Knowledge, json!("k"));
        state.tool_results.record_failure(CapabilityKind::Environment, "offline");
        state.iteration_count = 2;
        state.reasoning = "a | b".to_string();

        let result = compile(&state, 0.9);

        assert!(result.success);
        assert_eq!(result.query_analysis.query_type, "complex");
        assert_eq!(result.query_analysis.tools_needed, vec!["knowledge", "environment"]);
        assert_eq!(result.query_analysis.iterations, 2);
        assert_eq!(result.query_analysis.confidence, 0.9);
        assert_eq!(result.workflow_path, "iterations=2, tools=[knowledge, environment]");
        assert_eq!(result.reasoning, "a | b");
    }

    #[test]
    fn empty_run_reports_zero_tools() {
        let state = OrchestrationState::new("hello", vec![], None);
        let result = compile(&state, 0.9);
        assert_eq!(result.workflow_path, "iterations=0, tools=[]");
        assert!(result.tool_results.is_empty());
    }

    #[test]
    fn failure_result_carries_the_error() {
        let err = PlantMateError::StateMachineError {
            reason: "illegal transition".to_string(),
        };
        let result = compile_failure(&err);

        assert!(!result.success);
        assert_eq!(result.query_analysis.query_type, "error");
        assert_eq!(result.query_analysis.confidence, 0.0);
        let message = result.tool_results.get("error").and_then(|v| v.as_str()).unwrap();
        assert!(message.contains("illegal transition"));
        assert!(result.reasoning.starts_with("workflow aborted"));
        assert!(result.reasoning.contains("illegal transition"));
    }
}
