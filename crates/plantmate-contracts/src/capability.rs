//! Capability identities and the ordered bag of capability outputs.
//!
//! A run may execute each capability at most once. Its output lands in
//! `ToolResults` under the capability name, or under `"<name>_error"` when
//! the provider failed. Insertion order is execution order.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Suffix appended to a capability name when its provider failed.
pub const ERROR_SUFFIX: &str = "_error";

/// The three information-gathering capabilities the orchestrator can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Live sensor readings for the monitored plant.
    Environment,
    /// Open web / information search.
    Search,
    /// Internal plant-care knowledge base.
    Knowledge,
}

impl CapabilityKind {
    /// Every capability, in the order offered to the oracle.
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Environment,
        CapabilityKind::Search,
        CapabilityKind::Knowledge,
    ];

    /// Stable key used in `ToolResults` and prompts.
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::Environment => "environment",
            CapabilityKind::Search => "search",
            CapabilityKind::Knowledge => "knowledge",
        }
    }

    /// Key under which a provider failure is recorded.
    pub fn error_key(self) -> String {
        format!("{}{}", self.name(), ERROR_SUFFIX)
    }

    /// Parse a capability name as an oracle might spell it.
    ///
    /// Case-insensitive; `web_search` and `websearch` are accepted for `search`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "environment" | "env" => Some(CapabilityKind::Environment),
            "search" | "web_search" | "websearch" => Some(CapabilityKind::Search),
            "knowledge" => Some(CapabilityKind::Knowledge),
            _ => None,
        }
    }

    /// Map a `ToolResults` key (success or error form) back to its capability.
    pub fn from_result_key(key: &str) -> Option<Self> {
        let base = key.strip_suffix(ERROR_SUFFIX).unwrap_or(key);
        Self::ALL.into_iter().find(|kind| kind.name() == base)
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown capability: {s}"))
    }
}

/// Capability outputs keyed by name, kept in insertion order.
///
/// Serializes as a JSON object whose key order matches execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResults {
    entries: Vec<(String, Value)>,
}

impl ToolResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    ///
    /// Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Record a successful provider output under the capability name.
    pub fn record_success(&mut self, kind: CapabilityKind, output: Value) {
        self.insert(kind.name(), output);
    }

    /// Record a provider failure under `"<capability>_error"`.
    pub fn record_failure(&mut self, kind: CapabilityKind, message: impl Into<String>) {
        self.insert(kind.error_key(), Value::String(message.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True if the capability was executed in this run, successfully or not.
    pub fn attempted(&self, kind: CapabilityKind) -> bool {
        self.contains_key(kind.name()) || self.contains_key(&kind.error_key())
    }

    /// Capabilities executed so far, in execution order.
    pub fn attempted_capabilities(&self) -> Vec<CapabilityKind> {
        let mut seen = Vec::new();
        for kind in self.keys().filter_map(CapabilityKind::from_result_key) {
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        seen
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for ToolResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ToolResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ToolResultsVisitor;

        impl<'de> Visitor<'de> for ToolResultsVisitor {
            type Value = ToolResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of capability outputs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ToolResults, A::Error> {
                let mut results = ToolResults::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    results.insert(key, value);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ToolResultsVisitor)
    }
}
