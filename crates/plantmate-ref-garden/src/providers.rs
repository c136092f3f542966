//! Reference capability providers backed by `mock_data`.
//!
//! - `EnvironmentAnalyzer`: scores the sensor readings passed as `aux_data`
//! - `KnowledgeBaseProvider`: keyword-overlap lookup over the care guides
//! - `CannedSearchProvider`: keyword-overlap lookup over a fixed web corpus

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use plantmate_contracts::{
    capability::CapabilityKind,
    error::{PlantMateError, PlantMateResult},
};
use plantmate_core::traits::CapabilityProvider;

use crate::mock_data::{
    threshold_for, KnowledgeEntry, SearchEntry, SensorThreshold, KNOWLEDGE_BASE, SEARCH_CORPUS,
};

/// Documents returned per lookup.
pub const DEFAULT_LIMIT: usize = 3;

/// Sensor scores below this raise an alert.
const ALERT_BELOW: u32 = 70;

// ── Environment ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Optimal,
    LowNormal,
    HighNormal,
    CriticalLow,
    CriticalHigh,
}

impl SensorStatus {
    pub fn score(self) -> u32 {
        match self {
            SensorStatus::Optimal => 100,
            SensorStatus::LowNormal | SensorStatus::HighNormal => 80,
            SensorStatus::CriticalLow | SensorStatus::CriticalHigh => 30,
        }
    }

    fn advice(self, sensor: &str) -> String {
        match self {
            SensorStatus::Optimal => format!("{sensor} is ideal"),
            SensorStatus::LowNormal => format!("{sensor} is a little low; keep an eye on it"),
            SensorStatus::HighNormal => format!("{sensor} is a little high; keep an eye on it"),
            SensorStatus::CriticalLow => format!("{sensor} is far too low; act now"),
            SensorStatus::CriticalHigh => format!("{sensor} is far too high; act now"),
        }
    }
}

pub fn evaluate_sensor(value: f64, threshold: &SensorThreshold) -> SensorStatus {
    if (threshold.optimal_min..=threshold.optimal_max).contains(&value) {
        SensorStatus::Optimal
    } else if (threshold.min..=threshold.max).contains(&value) {
        if value < threshold.optimal_min {
            SensorStatus::LowNormal
        } else {
            SensorStatus::HighNormal
        }
    } else if value < threshold.min {
        SensorStatus::CriticalLow
    } else {
        SensorStatus::CriticalHigh
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorDetail {
    pub value: f64,
    pub status: SensorStatus,
    pub score: u32,
    pub recommendation: String,
}

/// The environment capability's output.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub current_readings: BTreeMap<String, f64>,
    /// Mean sensor score, 0–100, one decimal.
    pub health_score: f64,
    /// `excellent`, `good`, `fair`, `poor`, or `no_data`.
    pub overall_status: &'static str,
    pub status_details: BTreeMap<String, SensorDetail>,
    pub alerts: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

fn overall_status(health_score: f64) -> &'static str {
    if health_score >= 80.0 {
        "excellent"
    } else if health_score >= 60.0 {
        "good"
    } else if health_score >= 40.0 {
        "fair"
    } else {
        "poor"
    }
}

/// Score every known, numeric reading in `readings`. Unknown sensors and
/// null values are ignored.
pub fn analyze_readings(readings: &serde_json::Map<String, Value>) -> EnvironmentReport {
    let mut report = EnvironmentReport {
        current_readings: BTreeMap::new(),
        health_score: 0.0,
        overall_status: "no_data",
        status_details: BTreeMap::new(),
        alerts: Vec::new(),
        analyzed_at: Utc::now(),
    };

    let mut total = 0u32;
    for (sensor, raw) in readings {
        let (Some(threshold), Some(value)) = (threshold_for(sensor), raw.as_f64()) else {
            continue;
        };
        let status = evaluate_sensor(value, &threshold);
        let recommendation = status.advice(&sensor.replace('_', " "));
        if status.score() < ALERT_BELOW {
            report.alerts.push(format!("{sensor}: {recommendation}"));
        }
        total += status.score();
        report.current_readings.insert(sensor.clone(), value);
        report.status_details.insert(
            sensor.clone(),
            SensorDetail {
                value,
                status,
                score: status.score(),
                recommendation,
            },
        );
    }

    let counted = report.status_details.len();
    if counted > 0 {
        let mean = f64::from(total) / counted as f64;
        report.health_score = (mean * 10.0).round() / 10.0;
        report.overall_status = overall_status(report.health_score);
    }
    report
}

/// Scores live sensor readings supplied as the run's `aux_data`.
///
/// Accepts either a flat object of readings or one nested under `"sensors"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentAnalyzer;

impl EnvironmentAnalyzer {
    fn fail(reason: &str) -> PlantMateError {
        PlantMateError::ProviderFailed {
            capability: CapabilityKind::Environment.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl CapabilityProvider for EnvironmentAnalyzer {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Environment
    }

    async fn execute(&self, _query: &str, aux_data: Option<&Value>) -> PlantMateResult<Value> {
        let aux = aux_data.ok_or_else(|| Self::fail("no sensor data supplied"))?;
        let readings = aux
            .get("sensors")
            .unwrap_or(aux)
            .as_object()
            .ok_or_else(|| Self::fail("sensor data must be a JSON object"))?;

        let report = analyze_readings(readings);
        debug!(
            health_score = report.health_score,
            overall_status = report.overall_status,
            alerts = report.alerts.len(),
            "environment analysed"
        );
        serde_json::to_value(&report).map_err(|e| Self::fail(&e.to_string()))
    }
}

// ── Keyword ranking ──────────────────────────────────────────────────────────

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Entries sharing at least one keyword with `query`, best first. Ties keep
/// table order.
fn rank<'a, T>(
    query: &str,
    entries: &'a [T],
    keywords: impl Fn(&T) -> &[&'static str],
    limit: usize,
) -> Vec<(&'a T, usize)> {
    let words = tokens(query);
    let mut hits: Vec<(&T, usize)> = entries
        .iter()
        .map(|entry| {
            let overlap = keywords(entry)
                .iter()
                .filter(|k| words.contains(**k))
                .count();
            (entry, overlap)
        })
        .filter(|(_, overlap)| *overlap > 0)
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1));
    hits.truncate(limit);
    hits
}

// ── Knowledge ────────────────────────────────────────────────────────────────

/// Care-guide lookup over `KNOWLEDGE_BASE`.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseProvider {
    entries: &'static [KnowledgeEntry],
    limit: usize,
}

impl Default for KnowledgeBaseProvider {
    fn default() -> Self {
        Self {
            entries: KNOWLEDGE_BASE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[async_trait]
impl CapabilityProvider for KnowledgeBaseProvider {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Knowledge
    }

    async fn execute(&self, query: &str, _aux_data: Option<&Value>) -> PlantMateResult<Value> {
        let hits = rank(query, self.entries, |e| e.keywords, self.limit);
        debug!(query, hits = hits.len(), "knowledge base searched");

        let documents: Vec<Value> = hits
            .iter()
            .map(|(entry, score)| {
                json!({
                    "id": entry.id,
                    "title": entry.title,
                    "content": entry.content,
                    "score": score,
                })
            })
            .collect();
        let summary = hits
            .first()
            .map(|(entry, _)| entry.content)
            .unwrap_or("no matching care guide");

        Ok(json!({ "query": query, "documents": documents, "summary": summary }))
    }
}

// ── Search ───────────────────────────────────────────────────────────────────

/// Web search stand-in over `SEARCH_CORPUS`.
#[derive(Debug, Clone)]
pub struct CannedSearchProvider {
    corpus: &'static [SearchEntry],
    limit: usize,
}

impl Default for CannedSearchProvider {
    fn default() -> Self {
        Self {
            corpus: SEARCH_CORPUS,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[async_trait]
impl CapabilityProvider for CannedSearchProvider {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Search
    }

    async fn execute(&self, query: &str, _aux_data: Option<&Value>) -> PlantMateResult<Value> {
        let hits = rank(query, self.corpus, |e| e.keywords, self.limit);
        debug!(query, hits = hits.len(), "search corpus queried");

        let results: Vec<Value> = hits
            .iter()
            .map(|(entry, score)| {
                json!({
                    "title": entry.title,
                    "url": entry.url,
                    "content": entry.content,
                    "score": score,
                })
            })
            .collect();
        let summary = hits
            .first()
            .map(|(entry, _)| entry.content)
            .unwrap_or("no recent results");

        Ok(json!({ "query": query, "results": results, "summary": summary }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
