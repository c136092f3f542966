//! Collaborator traits for the PlantMate workflow engine.
//!
//! These four traits mark every boundary the engine crosses:
//!
//! - `DecisionOracle`     — untrusted judgment (usually a language model)
//! - `CapabilityProvider` — untrusted data source (sensors, knowledge, search)
//! - `TraceWriter`        — trusted sink (records every node visit)
//! - `DecisionVerifier`   — trusted checker (validates raw oracle answers)
//!
//! Oracle and provider calls are the only suspension points of a run and are
//! always wrapped in a timeout by the engine.

use async_trait::async_trait;
use serde_json::Value;

use plantmate_contracts::{
    capability::CapabilityKind,
    decision::{DecisionKind, DecisionPrompt},
    error::PlantMateResult,
    execution::StepRecord,
    verify::VerificationReport,
};

/// The judgment service the engine consults at each decision node.
///
/// Implementations are **untrusted**: the answer may be prose, malformed
/// JSON, or missing fields. The engine extracts and validates it, and applies
/// a safe default whenever that fails.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Answer one decision. The returned text should contain a JSON object
    /// matching `prompt.kind.response_schema()`.
    async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String>;
}

/// A source of domain data for one capability.
///
/// The result is opaque to the engine: it is stored, never inspected.
/// Providers may retry internally; the engine only sees the final outcome or
/// its own timeout.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Which capability this provider serves.
    fn kind(&self) -> CapabilityKind;

    /// Gather data for `query`. `aux_data` is forwarded verbatim from the run
    /// request (for example, live sensor readings).
    async fn execute(&self, query: &str, aux_data: Option<&Value>) -> PlantMateResult<Value>;
}

/// The step trace: one record per node visit.
///
/// A failed write is fatal to the run.
pub trait TraceWriter: Send + Sync {
    /// Append one step record. Records are never modified afterwards.
    fn write(&self, record: &StepRecord) -> PlantMateResult<()>;

    /// Mark the run as finished. Called once, after the last node.
    fn finalize(&self, run_id: &str) -> PlantMateResult<()>;
}

/// Structural check of a raw oracle answer before it is decoded.
pub trait DecisionVerifier: Send + Sync {
    /// Return a report with `passed = false` and populated `failures` when
    /// `payload` does not satisfy the schema for `kind`.
    fn verify(&self, kind: DecisionKind, payload: &Value) -> PlantMateResult<VerificationReport>;
}
