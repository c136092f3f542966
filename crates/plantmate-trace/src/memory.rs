//! In-memory `TraceWriter`.
//!
//! One writer records one run. Records must arrive in sequence order, and
//! nothing may be written after `finalize`; both violations are reported as
//! `TraceWriteFailed`, which the engine treats as fatal.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use plantmate_contracts::{
    error::{PlantMateError, PlantMateResult},
    execution::StepRecord,
};
use plantmate_core::traits::TraceWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{TraceEvent, TraceLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct TraceState {
    pub(crate) events: Vec<TraceEvent>,
    pub(crate) last_hash: String,
    /// Set by `finalize`.
    pub(crate) run_id: Option<String>,
}

// ── Public writer ─────────────────────────────────────────────────────────────

/// An append-only step trace backed by a SHA-256 hash chain.
///
/// Clones share the same chain, so a caller can keep one handle for
/// inspection while the engine writes through another.
#[derive(Clone)]
pub struct InMemoryTraceWriter {
    pub(crate) state: Arc<Mutex<TraceState>>,
}

impl Default for InMemoryTraceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTraceWriter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TraceState {
                events: Vec::new(),
                last_hash: TraceEvent::GENESIS_HASH.to_string(),
                run_id: None,
            })),
        }
    }

    fn lock(&self) -> PlantMateResult<MutexGuard<'_, TraceState>> {
        self.state.lock().map_err(|e| PlantMateError::TraceWriteFailed {
            reason: format!("trace state lock poisoned: {e}"),
        })
    }

    /// Snapshot every event written so far.
    pub fn export_log(&self) -> PlantMateResult<TraceLog> {
        let state = self.lock()?;
        Ok(TraceLog {
            run_id: state.run_id.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash: state
                .events
                .last()
                .map(|e| e.this_hash.clone())
                .unwrap_or_default(),
        })
    }

    /// `false` if the chain was tampered with or the lock is poisoned.
    pub fn verify_integrity(&self) -> bool {
        self.lock().map(|state| verify_chain(&state.events)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().map(|state| state.run_id.is_some()).unwrap_or(false)
    }
}

// ── TraceWriter impl ──────────────────────────────────────────────────────────

impl TraceWriter for InMemoryTraceWriter {
    fn write(&self, record: &StepRecord) -> PlantMateResult<()> {
        let mut state = self.lock()?;

        if let Some(run_id) = &state.run_id {
            return Err(PlantMateError::TraceWriteFailed {
                reason: format!("trace for run {run_id} is already finalized"),
            });
        }
        let sequence = state.events.len() as u64;
        if record.sequence != sequence {
            return Err(PlantMateError::TraceWriteFailed {
                reason: format!(
                    "out-of-order step record: expected sequence {sequence}, got {}",
                    record.sequence
                ),
            });
        }

        let prev_hash = state.last_hash.clone();
        let this_hash = hash_event(sequence, record, &prev_hash)?;

        debug!(sequence, node = %record.node, hash = %this_hash, "trace event appended");

        state.events.push(TraceEvent {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;
        Ok(())
    }

    fn finalize(&self, run_id: &str) -> PlantMateResult<()> {
        let mut state = self.lock()?;

        if let Some(existing) = &state.run_id {
            return Err(PlantMateError::TraceWriteFailed {
                reason: format!("trace already finalized for run {existing}"),
            });
        }
        state.run_id = Some(run_id.to_string());

        info!(
            run_id = %run_id,
            event_count = state.events.len(),
            terminal_hash = %state.last_hash,
            "step trace finalized"
        );
        Ok(())
    }
}
