//! The PlantMate orchestrator: the bounded decide/execute workflow.
//!
//! Every run walks the static workflow graph:
//!
//!   InitialAnalysis → DecideTools → Execute* → EvaluateCompleteness → FinalCompilation
//!          │               ▲                          │
//!          │               └──────── need more ───────┘
//!          └→ NoToolsNeeded
//!
//! Oracle and provider failures are absorbed where they happen, each with its
//! own safe default, and recorded in the audit trail. Only errors raised by
//! the driver itself (trace writes, illegal transitions, the transition
//! budget, collaborator panics) abort a run, and even then the caller gets a
//! well-formed `OrchestratorResult` with `success = false`.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use plantmate_contracts::{
    capability::CapabilityKind,
    conversation::ConversationTurn,
    decision::{NextAction, QueryAnalysis},
    error::{PlantMateError, PlantMateResult},
    execution::{
        OrchestrationState, OrchestratorResult, StepRecord, WorkflowNode, NO_TOOLS_MARKER,
    },
};

use crate::compile::{compile, compile_failure};
use crate::config::OrchestratorConfig;
use crate::graph::WorkflowGraph;
use crate::oracle::DecisionAdapter;
use crate::traits::{CapabilityProvider, DecisionOracle, DecisionVerifier, TraceWriter};

/// One inbound question.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub query: String,
    /// Prior turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// Forwarded to every provider call, e.g. live sensor readings.
    pub aux_data: Option<Value>,
}

impl RunRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_aux_data(mut self, aux_data: Value) -> Self {
        self.aux_data = Some(aux_data);
        self
    }
}

/// Where a step routes to, and the audit tag it produced.
struct Transition {
    next: WorkflowNode,
    event: String,
}

/// Append `event` to the audit trail and route to `next`.
fn advance(state: &mut OrchestrationState, next: WorkflowNode, event: String) -> Transition {
    state.append_reasoning(&event);
    Transition { next, event }
}

/// The workflow engine.
///
/// Holds only read-only collaborators and configuration, so one instance can
/// serve many concurrent runs behind an `Arc`. All mutable data lives in the
/// per-run `OrchestrationState`.
pub struct Orchestrator {
    graph: &'static WorkflowGraph,
    adapter: DecisionAdapter,
    providers: BTreeMap<CapabilityKind, Arc<dyn CapabilityProvider>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with no capability providers registered.
    ///
    /// Fails with `ConfigError` when `config` does not pass
    /// [`OrchestratorConfig::validate`].
    pub fn new(oracle: Arc<dyn DecisionOracle>, config: OrchestratorConfig) -> PlantMateResult<Self> {
        config.validate()?;
        Ok(Self {
            graph: WorkflowGraph::standard(),
            adapter: DecisionAdapter::new(oracle),
            providers: BTreeMap::new(),
            config,
        })
    }

    /// Register the provider for its capability, replacing any earlier one.
    pub fn with_provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        let kind = provider.kind();
        if self.providers.insert(kind, provider).is_some() {
            warn!(capability = %kind, "replacing previously registered provider");
        }
        self
    }

    /// Check every raw oracle answer with `verifier` before decoding it.
    pub fn with_verifier(mut self, verifier: Box<dyn DecisionVerifier>) -> Self {
        self.adapter.set_verifier(verifier);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn graph(&self) -> &'static WorkflowGraph {
        self.graph
    }

    /// Registered capabilities and the descriptions offered to the oracle.
    pub fn available_tools(&self) -> BTreeMap<CapabilityKind, String> {
        self.providers
            .keys()
            .map(|kind| (*kind, self.config.describe(*kind).to_string()))
            .collect()
    }

    /// Run the workflow for one question.
    ///
    /// Never fails: an aborted run is reported through `success = false`.
    /// Dropping the returned future cancels the run at its next oracle or
    /// provider call.
    pub async fn run(&self, request: RunRequest) -> OrchestratorResult {
        self.execute_run(request, None).await
    }

    /// Like [`run`](Self::run), writing one `StepRecord` per node visit to
    /// `trace`. A failed trace write aborts the run.
    pub async fn run_traced(&self, request: RunRequest, trace: &dyn TraceWriter) -> OrchestratorResult {
        self.execute_run(request, Some(trace)).await
    }

    async fn execute_run(
        &self,
        request: RunRequest,
        trace: Option<&dyn TraceWriter>,
    ) -> OrchestratorResult {
        let state = OrchestrationState::new(request.query, request.history, request.aux_data);
        let run_id = state.run_id.to_string();

        info!(
            run_id = %run_id,
            query = %state.query,
            history_len = state.history.len(),
            "orchestration run starting"
        );

        let outcome = AssertUnwindSafe(self.drive(state, trace)).catch_unwind().await;

        let result = match outcome {
            Ok(Ok(state)) => compile(&state, self.config.confidence),
            Ok(Err(e)) => {
                error!(run_id = %run_id, error = %e, "orchestration run aborted");
                compile_failure(&e)
            }
            Err(payload) => {
                let e = PlantMateError::RunPanicked {
                    reason: panic_message(payload.as_ref()),
                };
                error!(run_id = %run_id, error = %e, "orchestration run panicked");
                compile_failure(&e)
            }
        };

        info!(
            run_id = %run_id,
            success = result.success,
            iterations = result.query_analysis.iterations,
            workflow_path = %result.workflow_path,
            "orchestration run finished"
        );
        result
    }

    /// Walk the graph from its entry node to `End`.
    async fn drive(
        &self,
        mut state: OrchestrationState,
        trace: Option<&dyn TraceWriter>,
    ) -> PlantMateResult<OrchestrationState> {
        let run_id = state.run_id.to_string();
        let budget = u64::from(self.config.max_transitions);
        let mut node = self.graph.entry();
        let mut sequence: u64 = 0;

        while node != WorkflowNode::End {
            if sequence >= budget {
                return Err(PlantMateError::StateMachineError {
                    reason: format!("transition budget of {budget} exhausted at {node}"),
                });
            }

            let transition = self.step(node, &mut state).await?;
            self.graph.check(node, transition.next)?;

            debug!(
                run_id = %run_id,
                sequence,
                node = %node,
                next = %transition.next,
                iteration = state.iteration_count,
                event = %transition.event,
                "workflow step complete"
            );

            if let Some(trace) = trace {
                let record = StepRecord {
                    sequence,
                    node,
                    next: transition.next,
                    iteration: state.iteration_count,
                    event: transition.event,
                    timestamp: Utc::now(),
                };
                trace.write(&record)?;
            }

            node = transition.next;
            sequence += 1;
        }

        if let Some(trace) = trace {
            trace.finalize(&run_id)?;
        }
        Ok(state)
    }

    async fn step(
        &self,
        node: WorkflowNode,
        state: &mut OrchestrationState,
    ) -> PlantMateResult<Transition> {
        match node {
            WorkflowNode::InitialAnalysis => Ok(self.initial_analysis(state).await),
            WorkflowNode::DecideTools => Ok(self.decide_tools(state).await),
            WorkflowNode::ExecuteEnvironment => {
                self.execute_capability(CapabilityKind::Environment, state).await
            }
            WorkflowNode::ExecuteSearch => {
                self.execute_capability(CapabilityKind::Search, state).await
            }
            WorkflowNode::ExecuteKnowledge => {
                self.execute_capability(CapabilityKind::Knowledge, state).await
            }
            WorkflowNode::EvaluateCompleteness => Ok(self.evaluate_completeness(state).await),
            WorkflowNode::FinalCompilation => Ok(self.final_compilation(state)),
            WorkflowNode::NoToolsNeeded => Ok(self.no_tools_needed(state)),
            WorkflowNode::End => Err(PlantMateError::StateMachineError {
                reason: "no step runs at end".to_string(),
            }),
        }
    }

    // ── InitialAnalysis ──────────────────────────────────────────────────────

    async fn initial_analysis(&self, state: &mut OrchestrationState) -> Transition {
        let event = match self.adapter.initial_analysis(state, &self.config).await {
            Ok(decision) => {
                state.analysis = decision.into_analysis();
                format!(
                    "analysis: complexity={}, tools {}",
                    state.analysis.complexity.as_str(),
                    if state.analysis.needs_tools { "needed" } else { "not needed" }
                )
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "initial analysis failed, assuming tools are needed");
                state.analysis = QueryAnalysis::fallback(format!("analysis failed: {e}"));
                format!("analysis failed ({e}), assuming tools needed")
            }
        };

        state.iteration_count = 0;
        state.is_complete = false;

        let next = if state.analysis.needs_tools {
            WorkflowNode::DecideTools
        } else {
            WorkflowNode::NoToolsNeeded
        };
        advance(state, next, event)
    }

    // ── DecideTools ──────────────────────────────────────────────────────────

    /// Registered capabilities not yet executed in this run.
    fn offered_capabilities(&self, state: &OrchestrationState) -> Vec<CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .filter(|kind| !state.tool_results.attempted(*kind))
            .collect()
    }

    async fn decide_tools(&self, state: &mut OrchestrationState) -> Transition {
        let offered = self.offered_capabilities(state);

        let (action, event) = if offered.is_empty() {
            (NextAction::Evaluate, "no capabilities left to select".to_string())
        } else {
            match self.adapter.select_tool(state, &offered, &self.config).await {
                Ok(decision) => {
                    let action = decision.next_action();
                    match action.capability() {
                        // A capability executes at most once per run.
                        Some(kind) if state.tool_results.attempted(kind) => (
                            NextAction::Evaluate,
                            format!("{kind} already collected, evaluating"),
                        ),
                        Some(kind) if !offered.contains(&kind) => (
                            NextAction::Evaluate,
                            format!("{kind} unavailable, evaluating"),
                        ),
                        _ => {
                            let why = decision.reasoning.unwrap_or_default();
                            let event = if why.is_empty() {
                                format!("selected {action}")
                            } else {
                                format!("selected {action}: {why}")
                            };
                            (action, event)
                        }
                    }
                }
                Err(e) => {
                    warn!(run_id = %state.run_id, error = %e, "tool selection failed, evaluating");
                    (
                        NextAction::Evaluate,
                        format!("tool selection failed ({e}), evaluating"),
                    )
                }
            }
        };

        state.next_action = Some(action);
        let next = match action.capability() {
            Some(kind) => WorkflowNode::execute(kind),
            None => WorkflowNode::EvaluateCompleteness,
        };
        advance(state, next, event)
    }

    // ── Execute* ─────────────────────────────────────────────────────────────

    async fn execute_capability(
        &self,
        kind: CapabilityKind,
        state: &mut OrchestrationState,
    ) -> PlantMateResult<Transition> {
        if state.is_complete {
            return Err(PlantMateError::StateMachineError {
                reason: format!("capability {kind} requested after the run completed"),
            });
        }

        debug!(run_id = %state.run_id, capability = %kind, "executing capability");

        let outcome = match self.providers.get(&kind) {
            Some(provider) => {
                let call = provider.execute(&state.query, state.aux_data.as_ref());
                match tokio::time::timeout(self.config.provider_timeout(), call).await {
                    Ok(result) => result,
                    Err(_) => Err(PlantMateError::ProviderTimeout {
                        capability: kind.name().to_string(),
                        timeout_ms: self.config.provider_timeout_ms,
                    }),
                }
            }
            None => Err(PlantMateError::ProviderFailed {
                capability: kind.name().to_string(),
                reason: "no provider registered".to_string(),
            }),
        };

        let event = match outcome {
            Ok(output) => {
                state.tool_results.record_success(kind, output);
                format!("{kind} collected")
            }
            Err(e) => {
                warn!(run_id = %state.run_id, capability = %kind, error = %e, "capability failed");
                state.tool_results.record_failure(kind, e.to_string());
                format!("{kind} failed: {e}")
            }
        };

        state.iteration_count += 1;
        Ok(advance(state, WorkflowNode::EvaluateCompleteness, event))
    }

    // ── EvaluateCompleteness ─────────────────────────────────────────────────

    async fn evaluate_completeness(&self, state: &mut OrchestrationState) -> Transition {
        let mut event = match self.adapter.check_completeness(state, &self.config).await {
            Ok(decision) => {
                state.is_complete = decision.is_complete();
                match decision.missing_info.as_deref() {
                    Some(missing) if !state.is_complete && !missing.is_empty() => format!(
                        "completeness: {:.2}, missing: {missing}",
                        decision.confidence()
                    ),
                    _ => format!("completeness: {:.2}", decision.confidence()),
                }
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "completeness check failed, finishing");
                state.is_complete = true;
                format!("completeness check failed ({e}), finishing")
            }
        };

        // A cycle that selected nothing new cannot make progress by looping.
        let stalled = state.next_action == Some(NextAction::Evaluate);

        let next = if state.iteration_count >= self.config.max_iterations {
            event.push_str(", iteration ceiling reached");
            WorkflowNode::FinalCompilation
        } else if state.is_complete {
            WorkflowNode::FinalCompilation
        } else if stalled {
            event.push_str(", no new capability selected");
            WorkflowNode::FinalCompilation
        } else {
            WorkflowNode::DecideTools
        };
        advance(state, next, event)
    }

    // ── Terminal nodes ───────────────────────────────────────────────────────

    fn final_compilation(&self, state: &mut OrchestrationState) -> Transition {
        state.is_complete = true;
        advance(state, WorkflowNode::End, "final compilation".to_string())
    }

    fn no_tools_needed(&self, state: &mut OrchestrationState) -> Transition {
        state.tool_results.clear();
        state.is_complete = true;
        // The one place the audit trail is replaced rather than appended to.
        state.reasoning = NO_TOOLS_MARKER.to_string();
        Transition {
            next: WorkflowNode::End,
            event: NO_TOOLS_MARKER.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
