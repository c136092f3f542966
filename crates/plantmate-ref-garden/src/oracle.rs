//! A scripted `DecisionOracle` for deterministic scenarios.
//!
//! Each decision kind has its own queue of raw answers. Answers are handed
//! out in order and the last one repeats once the queue runs dry; a kind
//! with no answers at all fails like an unreachable model.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use plantmate_contracts::{
    decision::{DecisionKind, DecisionPrompt},
    error::{PlantMateError, PlantMateResult},
};
use plantmate_core::traits::DecisionOracle;

#[derive(Debug, Default)]
pub struct ScriptedOracle {
    scripts: BTreeMap<DecisionKind, Vec<String>>,
    asked: Mutex<BTreeMap<DecisionKind, usize>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `answers` for `kind`, after any already queued.
    pub fn script<I, S>(mut self, kind: DecisionKind, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripts
            .entry(kind)
            .or_default()
            .extend(answers.into_iter().map(Into::into));
        self
    }

    /// How often `kind` has been asked.
    pub fn times_asked(&self, kind: DecisionKind) -> usize {
        self.asked
            .lock()
            .map(|asked| asked.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, prompt: &DecisionPrompt) -> PlantMateResult<String> {
        let turn = {
            let mut asked = self.asked.lock().map_err(|e| PlantMateError::OracleFailed {
                reason: format!("script cursor poisoned: {e}"),
            })?;
            let counter = asked.entry(prompt.kind).or_default();
            *counter += 1;
            *counter - 1
        };

        let answers = self.scripts.get(&prompt.kind).map(Vec::as_slice).unwrap_or(&[]);
        answers
            .get(turn)
            .or_else(|| answers.last())
            .cloned()
            .ok_or_else(|| PlantMateError::OracleFailed {
                reason: format!("no scripted answer for {}", prompt.kind),
            })
    }
}
