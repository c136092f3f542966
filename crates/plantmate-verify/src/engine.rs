//! Schema-based decision verifier.
//!
//! `SchemaDecisionVerifier` implements `DecisionVerifier` from
//! `plantmate-core`. Verification runs in two phases:
//!
//! 1. **Structural**: the raw payload is validated against the JSON Schema
//!    for its decision kind, compiled once at construction.
//! 2. **Semantic**: named rules registered for that kind run in
//!    registration order.
//!
//! All failures are collected before returning.

use std::collections::BTreeMap;

use jsonschema::Validator;
use serde_json::Value;
use tracing::{debug, warn};

use plantmate_contracts::{
    decision::DecisionKind,
    error::{PlantMateError, PlantMateResult},
    verify::{DecisionSchema, VerificationFailure, VerificationReport},
};
use plantmate_core::traits::DecisionVerifier;

/// A caller-supplied semantic check. Returns `Some(message)` on failure.
pub type DecisionRuleFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

struct NamedRule {
    name: String,
    check: DecisionRuleFn,
}

/// Checks raw oracle answers before they are decoded.
pub struct SchemaDecisionVerifier {
    /// `None` means the kind has no structural constraint.
    validators: BTreeMap<DecisionKind, Option<Validator>>,
    rules: BTreeMap<DecisionKind, Vec<NamedRule>>,
}

impl SchemaDecisionVerifier {
    /// A verifier using the built-in schema for every decision kind.
    pub fn new() -> PlantMateResult<Self> {
        let mut verifier = Self {
            validators: BTreeMap::new(),
            rules: BTreeMap::new(),
        };
        for kind in DecisionKind::ALL {
            verifier.set_schema(DecisionSchema::builtin(kind))?;
        }
        Ok(verifier)
    }

    /// Replace the schema for `schema.kind`.
    pub fn with_schema(mut self, schema: DecisionSchema) -> PlantMateResult<Self> {
        self.set_schema(schema)?;
        Ok(self)
    }

    fn set_schema(&mut self, schema: DecisionSchema) -> PlantMateResult<()> {
        let validator = if schema.json_schema.is_null() {
            None
        } else {
            let compiled = jsonschema::validator_for(&schema.json_schema).map_err(|e| {
                PlantMateError::SchemaValidation {
                    reason: format!("invalid JSON Schema for {} decisions: {e}", schema.kind),
                }
            })?;
            Some(compiled)
        };
        self.validators.insert(schema.kind, validator);
        Ok(())
    }

    /// Register a semantic rule for `kind`. Failures are reported under
    /// `name`.
    pub fn register_rule(&mut self, kind: DecisionKind, name: impl Into<String>, check: DecisionRuleFn) {
        self.rules.entry(kind).or_default().push(NamedRule {
            name: name.into(),
            check,
        });
    }
}

impl DecisionVerifier for SchemaDecisionVerifier {
    fn verify(&self, kind: DecisionKind, payload: &Value) -> PlantMateResult<VerificationReport> {
        let mut failures: Vec<VerificationFailure> = Vec::new();

        // ── Phase 1: JSON Schema ──────────────────────────────────────────────
        if let Some(Some(validator)) = self.validators.get(&kind) {
            for error in validator.iter_errors(payload) {
                let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                warn!(kind = %kind, %message, "structural validation failure");
                failures.push(VerificationFailure {
                    rule_id: "json-schema".to_string(),
                    message,
                });
            }
        }

        // ── Phase 2: Semantic rules ───────────────────────────────────────────
        for rule in self.rules.get(&kind).into_iter().flatten() {
            if let Some(message) = (rule.check)(payload) {
                warn!(kind = %kind, rule = %rule.name, %message, "semantic rule failed");
                failures.push(VerificationFailure {
                    rule_id: rule.name.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(kind = %kind, passed, failure_count = failures.len(), "decision verification complete");
        Ok(VerificationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use plantmate_contracts::{
        capability::CapabilityKind,
        decision::{DecisionKind, DecisionPrompt},
        error::{PlantMateError, PlantMateResult},
        verify::DecisionSchema,
    };
    use plantmate_core::{
        traits::{CapabilityProvider, DecisionOracle, DecisionVerifier},
        Orchestrator, OrchestratorConfig, RunRequest,
    };

    use super::SchemaDecisionVerifier;

    fn verifier() -> SchemaDecisionVerifier {
        SchemaDecisionVerifier::new().unwrap()
    }

    // ── Built-in schemas ──────────────────────────────────────────────────────

    #[test]
    fn test_well_formed_decisions_pass() {
        let v = verifier();
        let cases = [
            (DecisionKind::InitialAnalysis, json!({ "needs_tools": true, "complexity": "simple" })),
            (DecisionKind::ToolSelection, json!({ "next_tool": "environment", "reasoning": null })),
            (DecisionKind::CompletenessCheck, json!({ "is_complete": false, "confidence": 0.4 })),
        ];
        for (kind, payload) in cases {
            let report = v.verify(kind, &payload).unwrap();
            assert!(report.passed, "{kind}: {:?}", report.failures);
        }
    }

    /// Missing fields fall back to defaults, so an empty object is valid.
    #[test]
    fn test_empty_object_passes() {
        let report = verifier().verify(DecisionKind::InitialAnalysis, &json!({})).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn test_wrong_field_type_fails() {
        let report = verifier()
            .verify(DecisionKind::InitialAnalysis, &json!({ "needs_tools": "yes" }))
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
        assert!(report.failures[0].message.contains("needs_tools"), "{}", report.failures[0].message);
    }

    /// Advisory fields are not constrained: the decoder drops bad values.
    #[test]
    fn test_advisory_field_values_pass() {
        let v = verifier();
        let cases = [
            (DecisionKind::InitialAnalysis, json!({ "needs_tools": false, "complexity": "trivial" })),
            (DecisionKind::CompletenessCheck, json!({ "is_complete": true, "confidence": 85 })),
            (DecisionKind::CompletenessCheck, json!({ "is_complete": false, "confidence": "high" })),
        ];
        for (kind, payload) in cases {
            let report = v.verify(kind, &payload).unwrap();
            assert!(report.passed, "{kind}: {:?}", report.failures);
        }
    }

    #[test]
    fn test_deciding_field_type_mismatch_fails() {
        let report = verifier()
            .verify(DecisionKind::CompletenessCheck, &json!({ "is_complete": "nearly" }))
            .unwrap();
        assert!(!report.passed);
        assert!(report.summary().contains("[json-schema]"));
    }

    // ── Overrides & rules ─────────────────────────────────────────────────────

    #[test]
    fn test_null_schema_disables_structural_check() {
        let v = verifier()
            .with_schema(DecisionSchema {
                kind: DecisionKind::InitialAnalysis,
                json_schema: Value::Null,
            })
            .unwrap();
        let report = v.verify(DecisionKind::InitialAnalysis, &json!({ "needs_tools": "yes" })).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let err = verifier()
            .with_schema(DecisionSchema {
                kind: DecisionKind::ToolSelection,
                json_schema: json!({ "type": 12 }),
            })
            .err()
            .unwrap();
        assert!(matches!(err, PlantMateError::SchemaValidation { .. }));
    }

    #[test]
    fn test_semantic_rule_applies_only_to_its_kind() {
        let mut v = verifier();
        v.register_rule(
            DecisionKind::ToolSelection,
            "known-tool",
            Box::new(|payload| match payload.get("next_tool").and_then(Value::as_str) {
                Some(name) if name != "evaluate" && CapabilityKind::from_name(name).is_none() => {
                    Some(format!("'{name}' is not a capability"))
                }
                _ => None,
            }),
        );

        let bad = v.verify(DecisionKind::ToolSelection, &json!({ "next_tool": "horoscope" })).unwrap();
        assert!(!bad.passed);
        assert_eq!(bad.failures[0].rule_id, "known-tool");

        let alias = v.verify(DecisionKind::ToolSelection, &json!({ "next_tool": "web_search" })).unwrap();
        assert!(alias.passed);

        let other = v.verify(DecisionKind::InitialAnalysis, &json!({ "next_tool": "horoscope" })).unwrap();
        assert!(other.passed);
    }

    // ── Engine integration ────────────────────────────────────────────────────

    /// Selects environment, then answers the completeness check with a
    /// non-boolean `is_complete`.
    struct EvasiveOracle;

    #[async_trait]
    impl DecisionOracle for EvasiveOracle {
        async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String> {
            Ok(match prompt.kind {
                DecisionKind::InitialAnalysis => r#"{"needs_tools": true}"#,
                DecisionKind::ToolSelection => r#"{"next_tool": "environment"}"#,
                DecisionKind::CompletenessCheck => r#"{"is_complete": "not yet", "confidence": 0.4}"#,
            }
            .to_string())
        }
    }

    struct CountingProvider {
        kind: CapabilityKind,
        calls: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl CapabilityProvider for CountingProvider {
        fn kind(&self) -> CapabilityKind {
            self.kind
        }

        async fn execute(&self, _query: &str, _aux: Option<&Value>) -> PlantMateResult<Value> {
            *self.calls.lock().unwrap() += 1;
            Ok(json!({ "ok": true }))
        }
    }

    /// A rejected completeness answer falls back to "complete", so the run
    /// stops after one capability instead of asking for more.
    #[tokio::test]
    async fn test_rejected_decision_takes_safe_default() {
        let calls = Arc::new(Mutex::new(0));
        let mut orch = Orchestrator::new(Arc::new(EvasiveOracle), OrchestratorConfig::default())
            .unwrap()
            .with_verifier(Box::new(verifier()));
        for kind in CapabilityKind::ALL {
            orch = orch.with_provider(Arc::new(CountingProvider {
                kind,
                calls: calls.clone(),
            }));
        }

        let result = orch.run(RunRequest::new("how is my plant?")).await;

        assert!(result.success);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(result.reasoning.contains("completeness check failed"));
        assert!(result.reasoning.contains("json-schema"));
    }

    /// Always selects environment and reports an out-of-range confidence
    /// alongside `is_complete: false`.
    struct OverconfidentOracle;

    #[async_trait]
    impl DecisionOracle for OverconfidentOracle {
        async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String> {
            Ok(match prompt.kind {
                DecisionKind::InitialAnalysis => r#"{"needs_tools": true, "complexity": "trivial"}"#,
                DecisionKind::ToolSelection => r#"{"next_tool": "environment"}"#,
                DecisionKind::CompletenessCheck => r#"{"is_complete": false, "confidence": 85}"#,
            }
            .to_string())
        }
    }

    /// Bad advisory fields pass verification, and the `is_complete: false`
    /// next to them still sends the run back to tool selection.
    #[tokio::test]
    async fn test_overconfident_answer_keeps_its_verdict() {
        let calls = Arc::new(Mutex::new(0));
        let mut orch = Orchestrator::new(Arc::new(OverconfidentOracle), OrchestratorConfig::default())
            .unwrap()
            .with_verifier(Box::new(verifier()));
        for kind in CapabilityKind::ALL {
            orch = orch.with_provider(Arc::new(CountingProvider {
                kind,
                calls: calls.clone(),
            }));
        }

        let result = orch.run(RunRequest::new("how is my plant?")).await;

        assert!(result.success);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(!result.reasoning.contains("failed"), "{}", result.reasoning);
        assert!(result.reasoning.contains("completeness: 0.50"), "{}", result.reasoning);
        assert!(result.reasoning.contains("environment already collected"), "{}", result.reasoning);
        assert_eq!(result.query_analysis.query_type, "medium");
    }
}
