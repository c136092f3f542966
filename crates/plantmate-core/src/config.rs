//! Orchestrator configuration, loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! max_iterations = 3
//! history_window = 10
//! oracle_timeout_ms = 30000
//! provider_timeout_ms = 60000
//!
//! [capabilities.environment]
//! description = "Live temperature, humidity, light and soil moisture"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use plantmate_contracts::{
    capability::CapabilityKind,
    error::{PlantMateError, PlantMateResult},
};

/// Text offered to the oracle for one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    pub description: String,
}

/// Tunables for the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Hard ceiling on capability executions per run.
    pub max_iterations: u32,
    /// How many trailing history turns are embedded in prompts.
    pub history_window: usize,
    pub oracle_timeout_ms: u64,
    pub provider_timeout_ms: u64,
    /// The confidence constant reported in every successful result.
    pub confidence: f64,
    /// Node visits allowed before the driver gives up with a fatal error.
    pub max_transitions: u32,
    /// Capability descriptions keyed by capability name.
    pub capabilities: BTreeMap<String, CapabilityConfig>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            history_window: 10,
            oracle_timeout_ms: 30_000,
            provider_timeout_ms: 60_000,
            confidence: 0.9,
            max_transitions: 32,
            capabilities: default_capabilities(),
        }
    }
}

fn default_capabilities() -> BTreeMap<String, CapabilityConfig> {
    let describe = |kind: CapabilityKind, text: &str| {
        (
            kind.name().to_string(),
            CapabilityConfig {
                description: text.to_string(),
            },
        )
    };
    BTreeMap::from([
        describe(
            CapabilityKind::Environment,
            "Environment data analyzer: real-time temperature, humidity, soil moisture \
             and light intensity assessment for the monitored plant",
        ),
        describe(
            CapabilityKind::Search,
            "Web information search: recent trends, news and research about plants",
        ),
        describe(
            CapabilityKind::Knowledge,
            "Plant knowledge base: care guides, species characteristics and expert know-how",
        ),
    ])
}

impl OrchestratorConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(source: &str) -> PlantMateResult<Self> {
        let mut config: OrchestratorConfig =
            toml::from_str(source).map_err(|e| PlantMateError::ConfigError {
                reason: format!("failed to parse orchestrator TOML: {e}"),
            })?;

        // Aliases such as `web_search` collapse onto the canonical name, and
        // capabilities the document does not mention keep their defaults.
        config.capabilities = config
            .capabilities
            .into_iter()
            .map(|(name, entry)| match CapabilityKind::from_name(&name) {
                Some(kind) => (kind.name().to_string(), entry),
                None => (name, entry),
            })
            .collect();
        for (name, entry) in default_capabilities() {
            config.capabilities.entry(name).or_insert(entry);
        }

        config.validate()?;
        debug!(
            max_iterations = config.max_iterations,
            history_window = config.history_window,
            "orchestrator configuration loaded"
        );
        Ok(config)
    }

    /// Read, parse, and validate a configuration file.
    pub fn from_file(path: &Path) -> PlantMateResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| PlantMateError::ConfigError {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> PlantMateResult<()> {
        let invalid = |reason: String| Err(PlantMateError::ConfigError { reason });

        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".to_string());
        }
        if self.oracle_timeout_ms == 0 || self.provider_timeout_ms == 0 {
            return invalid("timeouts must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return invalid(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        // Each capability run costs three node visits plus the bookends.
        let floor = self.max_iterations.saturating_mul(3).saturating_add(3);
        if self.max_transitions < floor {
            return invalid(format!(
                "max_transitions {} is below the {floor} visits {} iterations need",
                self.max_transitions, self.max_iterations
            ));
        }
        if let Some(name) = self
            .capabilities
            .keys()
            .find(|name| CapabilityKind::from_name(name).is_none())
        {
            return invalid(format!("unknown capability '{name}' in [capabilities]"));
        }
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Description offered to the oracle for `kind`.
    pub fn describe(&self, kind: CapabilityKind) -> &str {
        self.capabilities
            .get(kind.name())
            .map(|entry| entry.description.as_str())
            .unwrap_or(kind.name())
    }
}
