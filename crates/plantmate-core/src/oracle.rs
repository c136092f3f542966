//! Decision adapter: turns run state into oracle prompts and oracle text back
//! into typed decisions.
//!
//! Each call asks the oracle exactly once. Any failure (oracle error, timeout,
//! no JSON object, schema violation, type mismatch) comes back as an `Err`;
//! the caller owns the safe default because the right default depends on
//! which question was asked. The adapter never touches `OrchestrationState`
//! beyond reading it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use plantmate_contracts::{
    capability::CapabilityKind,
    decision::{
        CompletenessDecision, DecisionContext, DecisionKind, DecisionPrompt,
        InitialAnalysisDecision, ToolSelectionDecision,
    },
    error::{PlantMateError, PlantMateResult},
    execution::OrchestrationState,
};

use crate::config::OrchestratorConfig;
use crate::traits::{DecisionOracle, DecisionVerifier};

/// Wraps a `DecisionOracle` with prompt construction, a timeout, and decoding.
pub struct DecisionAdapter {
    oracle: Arc<dyn DecisionOracle>,
    verifier: Option<Box<dyn DecisionVerifier>>,
}

impl DecisionAdapter {
    pub fn new(oracle: Arc<dyn DecisionOracle>) -> Self {
        Self {
            oracle,
            verifier: None,
        }
    }

    pub fn set_verifier(&mut self, verifier: Box<dyn DecisionVerifier>) {
        self.verifier = Some(verifier);
    }

    pub async fn initial_analysis(
        &self,
        state: &OrchestrationState,
        config: &OrchestratorConfig,
    ) -> PlantMateResult<InitialAnalysisDecision> {
        let prompt = build_prompt(DecisionKind::InitialAnalysis, state, &[], config);
        self.decide(prompt, config).await
    }

    pub async fn select_tool(
        &self,
        state: &OrchestrationState,
        offered: &[CapabilityKind],
        config: &OrchestratorConfig,
    ) -> PlantMateResult<ToolSelectionDecision> {
        let prompt = build_prompt(DecisionKind::ToolSelection, state, offered, config);
        self.decide(prompt, config).await
    }

    pub async fn check_completeness(
        &self,
        state: &OrchestrationState,
        config: &OrchestratorConfig,
    ) -> PlantMateResult<CompletenessDecision> {
        let prompt = build_prompt(DecisionKind::CompletenessCheck, state, &[], config);
        self.decide(prompt, config).await
    }

    async fn decide<D: DeserializeOwned>(
        &self,
        prompt: DecisionPrompt,
        config: &OrchestratorConfig,
    ) -> PlantMateResult<D> {
        let kind = prompt.kind;
        debug!(kind = %kind, "asking decision oracle");

        let text = tokio::time::timeout(config.oracle_timeout(), self.oracle.decide(&prompt))
            .await
            .map_err(|_| PlantMateError::OracleTimeout {
                timeout_ms: config.oracle_timeout_ms,
            })??;

        let payload = parse_decision_payload(kind, &text)?;

        if let Some(verifier) = &self.verifier {
            let report = verifier.verify(kind, &payload)?;
            if !report.passed {
                let reason = report.summary();
                warn!(kind = %kind, failures = %reason, "oracle decision failed verification");
                return Err(malformed(kind, reason));
            }
        }

        serde_json::from_value(payload).map_err(|e| malformed(kind, e.to_string()))
    }
}

fn malformed(kind: DecisionKind, reason: impl Into<String>) -> PlantMateError {
    PlantMateError::MalformedDecision {
        kind: kind.name().to_string(),
        reason: reason.into(),
    }
}

/// Pull the decision object out of raw oracle text.
///
/// Models often wrap JSON in prose or a Markdown fence, so the first balanced
/// `{...}` object is used. Anything that is not a JSON object is malformed.
pub fn parse_decision_payload(kind: DecisionKind, text: &str) -> PlantMateResult<Value> {
    let candidate = extract_json_object(text)
        .ok_or_else(|| malformed(kind, "no JSON object found in oracle answer"))?;
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| malformed(kind, e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(malformed(kind, "oracle answer is not a JSON object"))
    }
}

/// Return the first balanced `{...}` span of `text`, honouring JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Build the prompt for one decision from the current state.
pub fn build_prompt(
    kind: DecisionKind,
    state: &OrchestrationState,
    offered: &[CapabilityKind],
    config: &OrchestratorConfig,
) -> DecisionPrompt {
    let context = DecisionContext {
        query: state.query.clone(),
        history: state.recent_history(config.history_window).to_vec(),
        collected: state.collected_keys(),
        offered: offered.to_vec(),
        iteration: state.iteration_count,
    };
    let instruction = render_instruction(kind, &context, config);
    DecisionPrompt {
        kind,
        instruction,
        context,
    }
}

fn render_instruction(
    kind: DecisionKind,
    context: &DecisionContext,
    config: &OrchestratorConfig,
) -> String {
    let collected = format!("[{}]", context.collected.join(", "));
    let mut lines: Vec<String> = Vec::new();

    match kind {
        DecisionKind::InitialAnalysis => {
            lines.push("Decide whether answering the user's question needs any tool.".into());
            lines.push(String::new());
            lines.push(format!("Current question: \"{}\"", context.query));
            if !context.history.is_empty() {
                lines.push(String::new());
                lines.push("Recent conversation:".into());
                lines.extend(
                    context
                        .history
                        .iter()
                        .map(|turn| format!("{}: {}", turn.role.label(), turn.content)),
                );
            }
            lines.extend(
                [
                    "",
                    "Consider:",
                    "1. Does the question need information about the plant?",
                    "2. Is it just a greeting or small talk?",
                    "3. Does it need concrete data or facts?",
                    "4. What does the earlier conversation imply is needed?",
                ]
                .map(String::from),
            );
        }
        DecisionKind::ToolSelection => {
            lines.push("Choose the next tool to run for the user's question.".into());
            lines.push(String::new());
            lines.push(format!("User question: \"{}\"", context.query));
            lines.push(format!("Current iteration: {}", context.iteration));
            lines.push(format!("Already collected: {collected}"));
            lines.push(String::new());
            lines.push("Available tools:".into());
            lines.extend(context.offered.iter().enumerate().map(|(index, capability)| {
                format!("{}. {}: {}", index + 1, capability.name(), config.describe(*capability))
            }));
            lines.extend(
                [
                    "",
                    "Rules:",
                    "- Prefer a category of information not yet collected.",
                    "- If the information is already sufficient, answer \"evaluate\".",
                    "- Plant condition or environment questions -> environment.",
                    "- Trends, news or research -> search.",
                    "- Care methods or expert knowledge -> knowledge.",
                ]
                .map(String::from),
            );
        }
        DecisionKind::CompletenessCheck => {
            lines.push("Judge whether the collected information answers the user's question.".into());
            lines.push(String::new());
            lines.push(format!("User question: \"{}\"", context.query));
            lines.push(format!("Collected: {collected}"));
            lines.push(format!("Current iteration: {}", context.iteration));
            lines.push(String::new());
            lines.push("Criteria:".into());
            lines.push("1. Is every key fact needed for an answer present?".into());
            lines.push("2. Is anything else still required?".into());
            lines.push(format!(
                "3. After {} iterations, treat the information as sufficient.",
                config.max_iterations
            ));
        }
    }

    lines.push(String::new());
    lines.push("Answer with a single JSON object matching this schema:".into());
    lines.push(kind.response_schema().to_string());
    lines.join("\n")
}
