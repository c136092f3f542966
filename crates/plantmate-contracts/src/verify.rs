//! Decision verification schema and report types.
//!
//! Before a raw oracle answer is decoded into a typed decision, a verifier
//! may check it against a `DecisionSchema`. A failing report makes the
//! decision malformed, which the engine treats as a recoverable failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::DecisionKind;

/// The JSON Schema a decision of one kind is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSchema {
    pub kind: DecisionKind,
    /// A JSON Schema document. `Null` disables structural checks.
    pub json_schema: Value,
}

impl DecisionSchema {
    /// The built-in schema for `kind`.
    pub fn builtin(kind: DecisionKind) -> Self {
        Self {
            kind,
            json_schema: kind.response_schema(),
        }
    }
}

/// The result of checking one raw decision payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if no violation was found.
    pub passed: bool,
    /// Every violation found. Empty on pass.
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }

    /// All failure messages joined for an error or log line.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single violation within a `VerificationReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub rule_id: String,
    pub message: String,
}
