//! # plantmate-trace
//!
//! Append-only, SHA-256 hash-chained step trace for PlantMate runs.
//!
//! ## Overview
//!
//! Every node visit the engine makes is written as a `StepRecord`; the
//! writer wraps each one in a `TraceEvent` linked to its predecessor by
//! hash. Editing any stored event breaks the chain, which `verify_chain`
//! detects.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plantmate_trace::InMemoryTraceWriter;
//!
//! let trace = InMemoryTraceWriter::new();
//! let result = orchestrator.run_traced(request, &trace).await;
//!
//! assert!(trace.verify_integrity());
//! let log = trace.export_log()?;
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{TraceEvent, TraceLog};
pub use memory::InMemoryTraceWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use plantmate_contracts::{
        decision::{DecisionKind, DecisionPrompt},
        error::{PlantMateError, PlantMateResult},
        execution::{StepRecord, WorkflowNode},
    };
    use plantmate_core::{traits::DecisionOracle, traits::TraceWriter, Orchestrator, OrchestratorConfig, RunRequest};

    use super::{verify_chain, InMemoryTraceWriter, TraceEvent};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(sequence: u64, node: WorkflowNode, next: WorkflowNode, event: &str) -> StepRecord {
        StepRecord {
            sequence,
            node,
            next,
            iteration: 0,
            event: event.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Three records along the no-tools path plus one extra.
    fn write_sample(writer: &InMemoryTraceWriter) {
        writer
            .write(&make_record(0, WorkflowNode::InitialAnalysis, WorkflowNode::DecideTools, "analysis"))
            .unwrap();
        writer
            .write(&make_record(1, WorkflowNode::DecideTools, WorkflowNode::EvaluateCompleteness, "selected evaluate"))
            .unwrap();
        writer
            .write(&make_record(2, WorkflowNode::EvaluateCompleteness, WorkflowNode::FinalCompilation, "completeness: 0.50"))
            .unwrap();
    }

    // ── Chain ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let writer = InMemoryTraceWriter::new();
        write_sample(&writer);
        assert!(writer.verify_integrity(), "chain must be valid after sequential writes");
        assert_eq!(writer.len(), 3);
    }

    #[test]
    fn test_tamper_detection() {
        let writer = InMemoryTraceWriter::new();
        write_sample(&writer);

        {
            let mut state = writer.state.lock().unwrap();
            state.events[1].record.event = "selected environment".to_string();
        }

        assert!(!writer.verify_integrity(), "edited event must break the chain");
    }

    #[test]
    fn test_dropped_event_is_detected() {
        let writer = InMemoryTraceWriter::new();
        write_sample(&writer);

        let mut events = writer.export_log().unwrap().events;
        events.remove(1);
        assert!(!verify_chain(&events));
    }

    #[test]
    fn test_genesis_hash() {
        let writer = InMemoryTraceWriter::new();
        write_sample(&writer);
        let log = writer.export_log().unwrap();
        assert_eq!(log.events[0].prev_hash, TraceEvent::GENESIS_HASH);
        assert_eq!(log.terminal_hash, log.events[2].this_hash);
    }

    #[test]
    fn test_verify_empty() {
        assert!(InMemoryTraceWriter::new().verify_integrity());
        assert!(verify_chain(&[]));
        assert!(InMemoryTraceWriter::new().export_log().unwrap().terminal_hash.is_empty());
    }

    // ── Write discipline ──────────────────────────────────────────────────────

    #[test]
    fn test_out_of_order_record_is_rejected() {
        let writer = InMemoryTraceWriter::new();
        let err = writer
            .write(&make_record(4, WorkflowNode::InitialAnalysis, WorkflowNode::DecideTools, "x"))
            .unwrap_err();
        assert!(matches!(err, PlantMateError::TraceWriteFailed { .. }));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_write_after_finalize_is_rejected() {
        let writer = InMemoryTraceWriter::new();
        write_sample(&writer);
        writer.finalize("run-1").unwrap();

        let err = writer
            .write(&make_record(3, WorkflowNode::FinalCompilation, WorkflowNode::End, "late"))
            .unwrap_err();
        assert!(err.to_string().contains("already finalized"));
        assert!(writer.finalize("run-1").is_err(), "a trace seals once");
        assert_eq!(writer.export_log().unwrap().run_id.as_deref(), Some("run-1"));
    }

    // ── Engine integration ────────────────────────────────────────────────────

    /// Answers every question with "no tools needed".
    struct GreetingOracle;

    #[async_trait]
    impl DecisionOracle for GreetingOracle {
        async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String> {
            assert_eq!(prompt.kind, DecisionKind::InitialAnalysis);
            Ok(r#"{"needs_tools": false, "complexity": "simple"}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_engine_run_produces_sealed_chain() {
        let orch = Orchestrator::new(Arc::new(GreetingOracle), OrchestratorConfig::default()).unwrap();
        let trace = InMemoryTraceWriter::new();

        let result = orch.run_traced(RunRequest::new("hi there"), &trace).await;
        assert!(result.success);

        let log = trace.export_log().unwrap();
        assert_eq!(log.path(), vec!["initial_analysis", "no_tools_needed"]);
        assert!(log.run_id.is_some());
        assert!(trace.is_finalized());
        assert!(trace.verify_integrity());
    }

    /// Reusing a sealed writer makes the second run's first write fail,
    /// which aborts that run.
    #[tokio::test]
    async fn test_reused_trace_aborts_second_run() {
        let orch = Orchestrator::new(Arc::new(GreetingOracle), OrchestratorConfig::default()).unwrap();
        let trace = InMemoryTraceWriter::new();

        assert!(orch.run_traced(RunRequest::new("hi"), &trace).await.success);
        let second = orch.run_traced(RunRequest::new("hi again"), &trace).await;

        assert!(!second.success);
        assert!(second.reasoning.contains("already finalized"));
    }
}
