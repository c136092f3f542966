//! Keyword-rule decision oracle.
//!
//! `RuleOracle` answers every decision kind from a `RuleSet` and implements
//! `DecisionOracle` from plantmate-core, so the engine can run without a
//! language model. Its answers are JSON text, exactly as a model's would be.
//!
//! Decision algorithm, with R the first rule matching the query:
//!
//! - **Initial analysis**: no R, or R names no capabilities → no tools.
//!   Otherwise tools are needed, at R's complexity.
//! - **Tool selection**: the first capability R names that is still offered,
//!   else `evaluate`.
//! - **Completeness**: complete once every capability R names has been
//!   attempted, successfully or not.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use plantmate_contracts::{
    capability::CapabilityKind,
    decision::{DecisionContext, DecisionKind, DecisionPrompt, NextAction},
    error::{PlantMateError, PlantMateResult},
};
use plantmate_core::traits::DecisionOracle;

use crate::rule::{DecisionRule, RuleSet};

/// A `DecisionOracle` driven by a TOML keyword rule list.
///
/// ```rust,ignore
/// use plantmate_rules::RuleOracle;
///
/// let oracle = RuleOracle::from_file(Path::new("rules/garden.toml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct RuleOracle {
    rules: RuleSet,
}

impl RuleOracle {
    /// Build from an already-parsed rule set, validating it.
    pub fn new(rules: RuleSet) -> PlantMateResult<Self> {
        validate(&rules)?;
        Ok(Self { rules })
    }

    /// Parse `s` as a TOML rule file.
    ///
    /// Returns `ConfigError` if the TOML is malformed, a rule has no id or
    /// keywords, or a rule names an unknown capability.
    pub fn from_toml_str(s: &str) -> PlantMateResult<Self> {
        let rules: RuleSet = toml::from_str(s).map_err(|e| PlantMateError::ConfigError {
            reason: format!("failed to parse rule TOML: {e}"),
        })?;
        Self::new(rules)
    }

    pub fn from_file(path: &Path) -> PlantMateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlantMateError::ConfigError {
            reason: format!("failed to read rule file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    // ── Per-kind answers ──────────────────────────────────────────────────────

    fn analyse(&self, ctx: &DecisionContext) -> Value {
        match self.rules.first_match(&ctx.query) {
            Some(rule) if !rule.capabilities.is_empty() => json!({
                "needs_tools": true,
                "reasoning": format!("matched rule '{}'", rule.id),
                "complexity": rule.complexity,
            }),
            Some(rule) => json!({
                "needs_tools": false,
                "reasoning": format!("rule '{}' needs no tools", rule.id),
                "complexity": rule.complexity,
            }),
            None => json!({
                "needs_tools": false,
                "reasoning": "no rule matched; treating as conversation",
                "complexity": "simple",
            }),
        }
    }

    fn select(&self, ctx: &DecisionContext) -> Value {
        let Some(rule) = self.rules.first_match(&ctx.query) else {
            return json!({
                "next_tool": NextAction::Evaluate.name(),
                "reasoning": "no rule matched",
            });
        };
        match rule
            .capability_kinds()
            .into_iter()
            .find(|kind| ctx.offered.contains(kind))
        {
            Some(kind) => json!({
                "next_tool": kind.name(),
                "reasoning": format!("rule '{}' wants {kind}", rule.id),
            }),
            None => json!({
                "next_tool": NextAction::Evaluate.name(),
                "reasoning": format!("rule '{}' has nothing left to collect", rule.id),
            }),
        }
    }

    fn judge(&self, ctx: &DecisionContext) -> Value {
        let Some(rule) = self.rules.first_match(&ctx.query) else {
            return json!({ "is_complete": true, "confidence": 1.0 });
        };

        let wanted = rule.capability_kinds();
        let missing: Vec<CapabilityKind> = wanted
            .iter()
            .copied()
            .filter(|kind| !attempted(ctx, *kind))
            .collect();

        if missing.is_empty() {
            return json!({ "is_complete": true, "confidence": 1.0 });
        }

        let have = wanted.len() - missing.len();
        let names: Vec<&str> = missing.iter().map(|k| k.name()).collect();
        json!({
            "is_complete": false,
            "missing_info": names.join(", "),
            "confidence": have as f64 / wanted.len() as f64,
        })
    }
}

/// Whether `kind` produced a result or an error entry.
fn attempted(ctx: &DecisionContext, kind: CapabilityKind) -> bool {
    ctx.collected
        .iter()
        .any(|key| CapabilityKind::from_result_key(key) == Some(kind))
}

fn validate(rules: &RuleSet) -> PlantMateResult<()> {
    let invalid = |rule: &DecisionRule, what: String| {
        Err(PlantMateError::ConfigError {
            reason: format!("rule '{}': {what}", rule.id),
        })
    };

    for rule in &rules.rules {
        if rule.id.trim().is_empty() {
            return invalid(rule, "id must not be empty".to_string());
        }
        if rule.keywords.is_empty() {
            return invalid(rule, "at least one keyword is required".to_string());
        }
        if let Some(name) = rule
            .capabilities
            .iter()
            .find(|name| CapabilityKind::from_name(name).is_none())
        {
            return invalid(rule, format!("unknown capability '{name}'"));
        }
    }
    Ok(())
}

#[async_trait]
impl DecisionOracle for RuleOracle {
    async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String> {
        let ctx = &prompt.context;
        let answer = match prompt.kind {
            DecisionKind::InitialAnalysis => self.analyse(ctx),
            DecisionKind::ToolSelection => self.select(ctx),
            DecisionKind::CompletenessCheck => self.judge(ctx),
        };
        debug!(kind = %prompt.kind, answer = %answer, "rule oracle answered");
        Ok(answer.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
