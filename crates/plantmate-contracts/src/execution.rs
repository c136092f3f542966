//! Per-run orchestration state, step records, and the public result contract.
//!
//! `OrchestrationState` is owned by exactly one run and threaded through every
//! step by `&mut`. `StepRecord` is what gets written to the step trace, one
//! per node visit. `OrchestratorResult` is what the caller receives.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    capability::{CapabilityKind, ToolResults},
    conversation::{ConversationTurn, RunId},
    decision::{NextAction, QueryAnalysis},
};

/// Reasoning marker written when a query is answered without any capability.
pub const NO_TOOLS_MARKER: &str = "no tools used: handled as general conversation";

/// Separator between audit-trail tags in `OrchestrationState::reasoning`.
pub const REASONING_SEPARATOR: &str = " | ";

/// A node of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowNode {
    InitialAnalysis,
    DecideTools,
    ExecuteEnvironment,
    ExecuteSearch,
    ExecuteKnowledge,
    EvaluateCompleteness,
    FinalCompilation,
    NoToolsNeeded,
    End,
}

impl WorkflowNode {
    pub fn name(self) -> &'static str {
        match self {
            WorkflowNode::InitialAnalysis => "initial_analysis",
            WorkflowNode::DecideTools => "decide_tools",
            WorkflowNode::ExecuteEnvironment => "execute_environment",
            WorkflowNode::ExecuteSearch => "execute_search",
            WorkflowNode::ExecuteKnowledge => "execute_knowledge",
            WorkflowNode::EvaluateCompleteness => "evaluate_completeness",
            WorkflowNode::FinalCompilation => "final_compilation",
            WorkflowNode::NoToolsNeeded => "no_tools_needed",
            WorkflowNode::End => "end",
        }
    }

    /// The execute node for a capability.
    pub fn execute(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Environment => WorkflowNode::ExecuteEnvironment,
            CapabilityKind::Search => WorkflowNode::ExecuteSearch,
            CapabilityKind::Knowledge => WorkflowNode::ExecuteKnowledge,
        }
    }

    /// The capability an execute node runs; `None` for decision nodes.
    pub fn capability(self) -> Option<CapabilityKind> {
        match self {
            WorkflowNode::ExecuteEnvironment => Some(CapabilityKind::Environment),
            WorkflowNode::ExecuteSearch => Some(CapabilityKind::Search),
            WorkflowNode::ExecuteKnowledge => Some(CapabilityKind::Knowledge),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable record of one node visit, written to the step trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Zero-based position of this visit within the run.
    pub sequence: u64,
    /// The node that ran.
    pub node: WorkflowNode,
    /// The node the engine routed to afterwards.
    pub next: WorkflowNode,
    /// `iteration_count` after the node ran.
    pub iteration: u32,
    /// The audit tag the node produced.
    pub event: String,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}

/// The mutable record threaded through one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationState {
    pub run_id: RunId,
    pub query: String,
    /// Caller history, oldest first.
    pub history: Vec<ConversationTurn>,
    /// Opaque data forwarded to every provider call (e.g. live sensor readings).
    pub aux_data: Option<Value>,
    pub analysis: QueryAnalysis,
    pub tool_results: ToolResults,
    /// Append-only audit trail. Only the no-tools path replaces it.
    pub reasoning: String,
    /// Capability executions so far. Decision steps never change it.
    pub iteration_count: u32,
    pub next_action: Option<NextAction>,
    pub is_complete: bool,
}

impl OrchestrationState {
    pub fn new(
        query: impl Into<String>,
        history: Vec<ConversationTurn>,
        aux_data: Option<Value>,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            query: query.into(),
            history,
            aux_data,
            analysis: QueryAnalysis::default(),
            tool_results: ToolResults::new(),
            reasoning: String::new(),
            iteration_count: 0,
            next_action: None,
            is_complete: false,
        }
    }

    /// Append one tag to the audit trail.
    pub fn append_reasoning(&mut self, event: &str) {
        if !self.reasoning.is_empty() {
            self.reasoning.push_str(REASONING_SEPARATOR);
        }
        self.reasoning.push_str(event);
    }

    /// The last `window` turns of history, oldest first.
    pub fn recent_history(&self, window: usize) -> &[ConversationTurn] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    /// `ToolResults` keys collected so far.
    pub fn collected_keys(&self) -> Vec<String> {
        self.tool_results.keys().map(str::to_string).collect()
    }
}

/// The analysis block of an `OrchestratorResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysisSummary {
    /// Complexity from the initial analysis, or `"error"` on an aborted run.
    pub query_type: String,
    /// Capabilities invoked, in execution order.
    pub tools_needed: Vec<String>,
    pub reasoning: String,
    pub confidence: f64,
    pub iterations: u32,
}

/// The public result of one run. Callers always get one, and branch on
/// `success` to tell a genuine run from an aborted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorResult {
    pub success: bool,
    pub query_analysis: QueryAnalysisSummary,
    pub tool_results: ToolResults,
    pub reasoning: String,
    /// Human-readable `iterations=N, tools=[...]`.
    pub workflow_path: String,
}

impl OrchestratorResult {
    /// Capabilities whose provider failed during an otherwise successful run.
    pub fn degraded_capabilities(&self) -> Vec<CapabilityKind> {
        self.tool_results
            .keys()
            .filter(|key| key.ends_with(crate::capability::ERROR_SUFFIX))
            .filter_map(CapabilityKind::from_result_key)
            .collect()
    }
}
