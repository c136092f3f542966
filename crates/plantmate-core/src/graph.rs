//! The workflow graph: an immutable table of legal transitions.
//!
//! The graph holds no run data. A single static instance is shared by every
//! run; the driver checks each transition a step function returns against it.

use plantmate_contracts::{
    error::{PlantMateError, PlantMateResult},
    execution::WorkflowNode,
};

use WorkflowNode::*;

/// A node and the nodes it may route to.
type Edge = (WorkflowNode, &'static [WorkflowNode]);

/// An immutable workflow definition.
#[derive(Debug)]
pub struct WorkflowGraph {
    entry: WorkflowNode,
    edges: &'static [Edge],
}

static STANDARD: WorkflowGraph = WorkflowGraph {
    entry: InitialAnalysis,
    edges: &[
        (InitialAnalysis, &[DecideTools, NoToolsNeeded]),
        (
            DecideTools,
            &[
                ExecuteEnvironment,
                ExecuteSearch,
                ExecuteKnowledge,
                EvaluateCompleteness,
            ],
        ),
        (ExecuteEnvironment, &[EvaluateCompleteness]),
        (ExecuteSearch, &[EvaluateCompleteness]),
        (ExecuteKnowledge, &[EvaluateCompleteness]),
        (EvaluateCompleteness, &[FinalCompilation, DecideTools]),
        (FinalCompilation, &[End]),
        (NoToolsNeeded, &[End]),
    ],
};

impl WorkflowGraph {
    /// The plant-assistant workflow.
    pub fn standard() -> &'static WorkflowGraph {
        &STANDARD
    }

    pub fn entry(&self) -> WorkflowNode {
        self.entry
    }

    /// Legal successors of `node`. Empty for `End` and unknown nodes.
    pub fn successors(&self, node: WorkflowNode) -> &'static [WorkflowNode] {
        self.edges
            .iter()
            .find(|(from, _)| *from == node)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn allows(&self, from: WorkflowNode, to: WorkflowNode) -> bool {
        self.successors(from).contains(&to)
    }

    /// Fail with `StateMachineError` unless `from → to` is an edge.
    pub fn check(&self, from: WorkflowNode, to: WorkflowNode) -> PlantMateResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(PlantMateError::StateMachineError {
                reason: format!("illegal transition {from} -> {to}"),
            })
        }
    }

    /// Nodes that route only to `End`.
    pub fn terminal_nodes(&self) -> Vec<WorkflowNode> {
        self.edges
            .iter()
            .filter(|(_, to)| *to == [End])
            .map(|(from, _)| *from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use plantmate_contracts::{capability::CapabilityKind, error::PlantMateError};

    use super::*;

    #[test]
    fn entry_is_initial_analysis() {
        assert_eq!(WorkflowGraph::standard().entry(), InitialAnalysis);
    }

    #[test]
    fn every_execute_node_routes_to_evaluation() {
        let graph = WorkflowGraph::standard();
        for kind in CapabilityKind::ALL {
            assert_eq!(
                graph.successors(WorkflowNode::execute(kind)),
                &[EvaluateCompleteness]
            );
        }
    }

    #[test]
    fn evaluation_loops_back_to_tool_selection() {
        let graph = WorkflowGraph::standard();
        assert!(graph.allows(EvaluateCompleteness, DecideTools));
        assert!(graph.allows(EvaluateCompleteness, FinalCompilation));
        assert!(!graph.allows(EvaluateCompleteness, ExecuteSearch));
    }

    #[test]
    fn terminal_nodes_are_compilation_and_no_tools() {
        let mut terminals = WorkflowGraph::standard().terminal_nodes();
        terminals.sort_by_key(|n| n.name());
        assert_eq!(terminals, vec![FinalCompilation, NoToolsNeeded]);
    }

    #[test]
    fn illegal_transition_is_a_state_machine_error() {
        let err = WorkflowGraph::standard()
            .check(NoToolsNeeded, DecideTools)
            .unwrap_err();
        match err {
            PlantMateError::StateMachineError { reason } => {
                assert!(reason.contains("no_tools_needed -> decide_tools"), "{reason}");
            }
            other => panic!("expected StateMachineError, got {other:?}"),
        }
    }

    #[test]
    fn end_has_no_successors() {
        assert!(WorkflowGraph::standard().successors(End).is_empty());
    }
}
