//! # plantmate-ref-garden
//!
//! Garden reference runtime for the PlantMate orchestrator.
//!
//! Demonstrates four orchestration scenarios using mock data:
//!
//! 1. **Greeting**: the oracle decides no tools are needed.
//! 2. **Plant status**: live sensor readings are scored by the environment
//!    analyzer in a single iteration.
//! 3. **Sensor failure**: the environment provider fails and the run still
//!    succeeds, with the failure recorded under `environment_error`.
//! 4. **Stubborn oracle**: the oracle never judges the answer complete and the
//!    iteration ceiling ends the run.
//!
//! All data is hardcoded. No external API calls are made.

use std::sync::Arc;

use plantmate_contracts::error::PlantMateResult;
use plantmate_core::{traits::DecisionOracle, Orchestrator, OrchestratorConfig};
use plantmate_rules::RuleOracle;
use plantmate_verify::SchemaDecisionVerifier;

pub mod mock_data;
pub mod oracle;
pub mod providers;
pub mod scenarios;

use providers::{CannedSearchProvider, EnvironmentAnalyzer, KnowledgeBaseProvider};

/// The keyword rules the offline oracle uses by default.
pub const GARDEN_RULES: &str = include_str!("../rules/garden.toml");

/// An orchestrator with all three reference providers registered and every
/// oracle answer checked against the built-in decision schemas.
pub fn garden_orchestrator(
    oracle: Arc<dyn DecisionOracle>,
    config: OrchestratorConfig,
) -> PlantMateResult<Orchestrator> {
    Ok(Orchestrator::new(oracle, config)?
        .with_provider(Arc::new(EnvironmentAnalyzer))
        .with_provider(Arc::new(CannedSearchProvider::default()))
        .with_provider(Arc::new(KnowledgeBaseProvider::default()))
        .with_verifier(Box::new(SchemaDecisionVerifier::new()?)))
}

/// The offline oracle loaded from `GARDEN_RULES`.
pub fn garden_rule_oracle() -> PlantMateResult<RuleOracle> {
    RuleOracle::from_toml_str(GARDEN_RULES)
}
