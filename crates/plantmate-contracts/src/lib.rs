//! # plantmate-contracts
//!
//! Shared types, decision payloads, and errors for the PlantMate
//! orchestrator.
//!
//! All crates in the workspace import from here. No orchestration logic lives
//! in this crate, only data definitions, their defaults, and error types.

pub mod capability;
pub mod conversation;
pub mod decision;
pub mod error;
pub mod execution;
pub mod verify;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use capability::{CapabilityKind, ToolResults};
    use conversation::{ConversationTurn, RunId};
    use decision::{
        Complexity, CompletenessDecision, InitialAnalysisDecision, NextAction,
        ToolSelectionDecision,
    };
    use error::PlantMateError;
    use execution::{OrchestrationState, OrchestratorResult, QueryAnalysisSummary};

    // ── CapabilityKind ───────────────────────────────────────────────────────

    #[test]
    fn capability_names_accept_aliases() {
        assert_eq!(CapabilityKind::from_name("web_search"), Some(CapabilityKind::Search));
        assert_eq!(CapabilityKind::from_name(" Environment "), Some(CapabilityKind::Environment));
        assert_eq!(CapabilityKind::from_name("KNOWLEDGE"), Some(CapabilityKind::Knowledge));
        assert_eq!(CapabilityKind::from_name("weather"), None);
    }

    #[test]
    fn capability_result_keys_map_back() {
        assert_eq!(
            CapabilityKind::from_result_key("environment_error"),
            Some(CapabilityKind::Environment)
        );
        assert_eq!(CapabilityKind::from_result_key("search"), Some(CapabilityKind::Search));
        assert_eq!(CapabilityKind::from_result_key("error"), None);
    }

    // ── ToolResults ──────────────────────────────────────────────────────────

    #[test]
    fn tool_results_keep_insertion_order() {
        let mut results = ToolResults::new();
        results.record_success(CapabilityKind::Knowledge, json!("k"));
        results.record_failure(CapabilityKind::Environment, "sensor offline");
        results.record_success(CapabilityKind::Search, json!({ "hits": 2 }));

        let keys: Vec<&str> = results.keys().collect();
        assert_eq!(keys, vec!["knowledge", "environment_error", "search"]);

        let encoded = serde_json::to_string(&results).unwrap();
        assert!(
            encoded.find("knowledge").unwrap() < encoded.find("environment_error").unwrap(),
            "serialized order must follow execution order: {encoded}"
        );
    }

    #[test]
    fn tool_results_replace_in_place() {
        let mut results = ToolResults::new();
        results.insert("environment", json!(1));
        results.insert("search", json!(2));
        let previous = results.insert("environment", json!(3));

        assert_eq!(previous, Some(json!(1)));
        assert_eq!(results.len(), 2);
        assert_eq!(results.keys().next(), Some("environment"));
        assert_eq!(results.get("environment"), Some(&json!(3)));
    }

    #[test]
    fn tool_results_attempted_covers_error_keys() {
        let mut results = ToolResults::new();
        results.record_failure(CapabilityKind::Environment, "boom");

        assert!(results.attempted(CapabilityKind::Environment));
        assert!(!results.attempted(CapabilityKind::Search));
        assert_eq!(results.attempted_capabilities(), vec![CapabilityKind::Environment]);
    }

    #[test]
    fn tool_results_deserialize_preserves_document_order() {
        let results: ToolResults =
            serde_json::from_str(r#"{"search": 1, "environment": 2}"#).unwrap();
        let keys: Vec<&str> = results.keys().collect();
        assert_eq!(keys, vec!["search", "environment"]);
    }

    // ── Decision defaults ────────────────────────────────────────────────────

    #[test]
    fn initial_analysis_missing_fields_fail_open() {
        let decision: InitialAnalysisDecision = serde_json::from_value(json!({})).unwrap();
        let analysis = decision.into_analysis();
        assert!(analysis.needs_tools);
        assert_eq!(analysis.complexity, Complexity::Medium);
    }

    #[test]
    fn tool_selection_unknown_tool_means_evaluate() {
        let decision = ToolSelectionDecision {
            next_tool: Some("astrology".to_string()),
            reasoning: None,
        };
        assert_eq!(decision.next_action(), NextAction::Evaluate);

        let decision = ToolSelectionDecision {
            next_tool: Some("web_search".to_string()),
            reasoning: None,
        };
        assert_eq!(decision.next_action(), NextAction::Search);

        assert_eq!(ToolSelectionDecision::default().next_action(), NextAction::Evaluate);
    }

    #[test]
    fn completeness_missing_fields_mean_complete() {
        let decision = CompletenessDecision::default();
        assert!(decision.is_complete());
        assert_eq!(decision.confidence(), CompletenessDecision::DEFAULT_CONFIDENCE);
    }

    #[test]
    fn bad_advisory_fields_keep_the_decision() {
        let decision: InitialAnalysisDecision =
            serde_json::from_value(json!({ "needs_tools": false, "complexity": "trivial", "reasoning": 3 }))
                .unwrap();
        assert_eq!(decision.needs_tools, Some(false));
        assert_eq!(decision.complexity, None);
        assert_eq!(decision.reasoning, None);

        let decision: CompletenessDecision =
            serde_json::from_value(json!({ "is_complete": false, "confidence": "high", "missing_info": null }))
                .unwrap();
        assert!(!decision.is_complete());
        assert_eq!(decision.confidence(), CompletenessDecision::DEFAULT_CONFIDENCE);

        let decision: CompletenessDecision =
            serde_json::from_value(json!({ "is_complete": true, "confidence": 85 })).unwrap();
        assert_eq!(decision.confidence(), CompletenessDecision::DEFAULT_CONFIDENCE);
    }

    #[test]
    fn deciding_field_type_mismatch_is_still_an_error() {
        let decoded = serde_json::from_value::<InitialAnalysisDecision>(json!({ "needs_tools": "yes" }));
        assert!(decoded.is_err());
    }

    // ── OrchestrationState ───────────────────────────────────────────────────

    #[test]
    fn reasoning_appends_with_separator() {
        let mut state = OrchestrationState::new("q", vec![], None);
        state.append_reasoning("first");
        state.append_reasoning("second");
        assert_eq!(state.reasoning, "first | second");
    }

    #[test]
    fn recent_history_keeps_newest_turns() {
        let history: Vec<ConversationTurn> =
            (0..12).map(|i| ConversationTurn::user(format!("turn {i}"))).collect();
        let state = OrchestrationState::new("q", history, None);

        let recent = state.recent_history(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "turn 2");
        assert_eq!(recent[9].content, "turn 11");
        assert_eq!(state.recent_history(50).len(), 12);
    }

    #[test]
    fn run_id_new_produces_unique_values() {
        let unique: std::collections::HashSet<String> =
            (0..100).map(|_| RunId::new().to_string()).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn result_reports_degraded_capabilities() {
        let mut tool_results = ToolResults::new();
        tool_results.record_success(CapabilityKind::Knowledge, json!("ok"));
        tool_results.record_failure(CapabilityKind::Search, "offline");

        let result = OrchestratorResult {
            success: true,
            query_analysis: QueryAnalysisSummary {
                query_type: "medium".to_string(),
                tools_needed: vec!["knowledge".to_string(), "search".to_string()],
                reasoning: String::new(),
                confidence: 0.9,
                iterations: 2,
            },
            tool_results,
            reasoning: String::new(),
            workflow_path: String::new(),
        };

        assert_eq!(result.degraded_capabilities(), vec![CapabilityKind::Search]);
    }

    // ── PlantMateError ───────────────────────────────────────────────────────

    #[test]
    fn error_provider_failed_display() {
        let err = PlantMateError::ProviderFailed {
            capability: "environment".to_string(),
            reason: "sensor offline".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("environment"));
        assert!(msg.contains("sensor offline"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn error_trace_write_failed_is_fatal() {
        let err = PlantMateError::TraceWriteFailed {
            reason: "disk full".to_string(),
        };
        assert!(err.to_string().contains("trace write failed"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn error_malformed_decision_display() {
        let err = PlantMateError::MalformedDecision {
            kind: "tool_selection".to_string(),
            reason: "no JSON object found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("malformed tool_selection decision"));
        assert!(msg.contains("no JSON object"));
    }
}
