//! Decision kinds, typed decision payloads, and the prompt handed to the oracle.
//!
//! The oracle is untrusted: any field may be missing. Each payload type keeps
//! its fields optional and exposes accessors that apply the documented
//! default, so "missing means default" is decided in exactly one place.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::capability::CapabilityKind;
use crate::conversation::ConversationTurn;

/// The three questions the engine asks the decision oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Does this query need any capability at all?
    InitialAnalysis,
    /// Which capability should run next?
    ToolSelection,
    /// Is the collected information sufficient?
    CompletenessCheck,
}

impl DecisionKind {
    pub const ALL: [DecisionKind; 3] = [
        DecisionKind::InitialAnalysis,
        DecisionKind::ToolSelection,
        DecisionKind::CompletenessCheck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DecisionKind::InitialAnalysis => "initial_analysis",
            DecisionKind::ToolSelection => "tool_selection",
            DecisionKind::CompletenessCheck => "completeness_check",
        }
    }

    /// JSON Schema the oracle's answer must satisfy.
    ///
    /// No field is required: a missing field falls back to its default. Only
    /// the deciding field (`needs_tools`, `next_tool`, `is_complete`) is typed;
    /// the descriptive fields are advisory and a bad value there is ignored.
    pub fn response_schema(self) -> Value {
        match self {
            DecisionKind::InitialAnalysis => json!({
                "type": "object",
                "properties": {
                    "needs_tools": { "type": "boolean" },
                    "reasoning": { "description": "short explanation" },
                    "complexity": { "description": "simple, medium or complex" }
                }
            }),
            DecisionKind::ToolSelection => json!({
                "type": "object",
                "properties": {
                    "next_tool": { "type": "string" },
                    "reasoning": { "description": "short explanation" }
                }
            }),
            DecisionKind::CompletenessCheck => json!({
                "type": "object",
                "properties": {
                    "is_complete": { "type": "boolean" },
                    "missing_info": { "description": "what is still missing" },
                    "confidence": { "description": "number between 0 and 1" }
                }
            }),
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How involved the oracle judged the query to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settled outcome of the initial analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub needs_tools: bool,
    pub reasoning: String,
    pub complexity: Complexity,
}

impl QueryAnalysis {
    /// The fail-open analysis used when the oracle cannot answer: assume
    /// tools are needed.
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            needs_tools: true,
            reasoning: reasoning.into(),
            complexity: Complexity::Medium,
        }
    }
}

impl Default for QueryAnalysis {
    fn default() -> Self {
        Self::fallback(String::new())
    }
}

/// What the engine should do after a tool-selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Environment,
    Search,
    Knowledge,
    /// Stop collecting and judge completeness.
    Evaluate,
}

impl NextAction {
    /// Parse an oracle's `next_tool` value. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case("evaluate") {
            return Some(NextAction::Evaluate);
        }
        CapabilityKind::from_name(name).map(Self::from)
    }

    /// The capability to execute, or `None` for `Evaluate`.
    pub fn capability(self) -> Option<CapabilityKind> {
        match self {
            NextAction::Environment => Some(CapabilityKind::Environment),
            NextAction::Search => Some(CapabilityKind::Search),
            NextAction::Knowledge => Some(CapabilityKind::Knowledge),
            NextAction::Evaluate => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self.capability() {
            Some(kind) => kind.name(),
            None => "evaluate",
        }
    }
}

impl From<CapabilityKind> for NextAction {
    fn from(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Environment => NextAction::Environment,
            CapabilityKind::Search => NextAction::Search,
            CapabilityKind::Knowledge => NextAction::Knowledge,
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode an advisory field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

/// Oracle answer to [`DecisionKind::InitialAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialAnalysisDecision {
    #[serde(default)]
    pub needs_tools: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub complexity: Option<Complexity>,
}

impl InitialAnalysisDecision {
    /// Settle the decision. A missing `needs_tools` means tools are needed.
    pub fn into_analysis(self) -> QueryAnalysis {
        QueryAnalysis {
            needs_tools: self.needs_tools.unwrap_or(true),
            reasoning: self.reasoning.unwrap_or_default(),
            complexity: self.complexity.unwrap_or_default(),
        }
    }
}

/// Oracle answer to [`DecisionKind::ToolSelection`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSelectionDecision {
    #[serde(default)]
    pub next_tool: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reasoning: Option<String>,
}

impl ToolSelectionDecision {
    /// The selected action; a missing or unknown tool means `Evaluate`.
    pub fn next_action(&self) -> NextAction {
        self.next_tool
            .as_deref()
            .and_then(NextAction::parse)
            .unwrap_or(NextAction::Evaluate)
    }
}

/// Oracle answer to [`DecisionKind::CompletenessCheck`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessDecision {
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub missing_info: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
}

impl CompletenessDecision {
    /// Confidence reported when the oracle omits one.
    pub const DEFAULT_CONFIDENCE: f64 = 0.5;

    /// A missing `is_complete` means complete.
    pub fn is_complete(&self) -> bool {
        self.is_complete.unwrap_or(true)
    }

    /// The reported confidence; anything outside [0, 1] counts as missing.
    pub fn confidence(&self) -> f64 {
        self.confidence
            .filter(|c| (0.0..=1.0).contains(c))
            .unwrap_or(Self::DEFAULT_CONFIDENCE)
    }
}

/// The state subset a decision is allowed to see.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    pub query: String,
    /// Recent history, already trimmed to the configured window.
    pub history: Vec<ConversationTurn>,
    /// `ToolResults` keys collected so far, in execution order.
    pub collected: Vec<String>,
    /// Capabilities the oracle may still choose. Empty outside tool selection.
    pub offered: Vec<CapabilityKind>,
    pub iteration: u32,
}

/// A fully built question for the oracle.
///
/// `instruction` is the natural-language rendering for model-backed oracles;
/// `context` carries the same facts in structured form for rule-based ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPrompt {
    pub kind: DecisionKind,
    pub instruction: String,
    pub context: DecisionContext,
}
