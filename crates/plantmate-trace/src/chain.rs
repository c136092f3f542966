//! Hash-chain primitives for the step trace.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. compact JSON of the step record

use sha2::{Digest, Sha256};

use plantmate_contracts::{
    error::{PlantMateError, PlantMateResult},
    execution::StepRecord,
};

use crate::event::TraceEvent;

/// SHA-256 over one trace entry, as a lowercase 64-character hex string.
pub fn hash_event(sequence: u64, record: &StepRecord, prev_hash: &str) -> PlantMateResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| PlantMateError::TraceWriteFailed {
        reason: format!("step record {sequence} is not serializable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Check linkage and hash correctness of every event, in order.
///
/// Valid when the first event links to `GENESIS_HASH`, each later event links
/// to its predecessor's `this_hash`, sequences count up from zero, and every
/// stored hash matches the one recomputed from the event's own fields. An
/// empty chain is valid.
pub fn verify_chain(events: &[TraceEvent]) -> bool {
    let mut expected_prev = TraceEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }
        match hash_event(event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }
        expected_prev = event.this_hash.clone();
    }

    true
}
