//! Trace entry and sealed log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plantmate_contracts::execution::StepRecord;

/// One link in the hash chain: a `StepRecord` plus the hashes that make
/// tampering detectable.
///
/// Changing any field, including those of the embedded record, invalidates
/// `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub record: StepRecord,
    /// `this_hash` of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,
    pub this_hash: String,
}

impl TraceEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// The exported trace of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    /// Set once the engine has finalized the run; `None` for a run that
    /// aborted before reaching `End`.
    pub run_id: Option<String>,
    pub events: Vec<TraceEvent>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last event. Empty when no event was written.
    pub terminal_hash: String,
}

impl TraceLog {
    /// The node path the run took, in visit order.
    pub fn path(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.record.node.name()).collect()
    }
}
