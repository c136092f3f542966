//! Simulated garden data for the PlantMate reference runtime.
//!
//! All data in this module is hardcoded. No sensors, search engines or
//! document stores are contacted; these tables stand in for them.

use serde_json::{json, Value};

// ── Sensor thresholds ─────────────────────────────────────────────────────────

/// Healthy and tolerable bands for one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorThreshold {
    pub min: f64,
    pub max: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
}

/// Known sensors and their bands, for a typical indoor foliage plant.
///
/// - temperature (°C):    tolerable 18–28,   optimal 20–25
/// - humidity (%):        tolerable 30–70,   optimal 40–60
/// - light_intensity (lux): tolerable 200–2000, optimal 500–1500
/// - soil_moisture (%):   tolerable 20–80,   optimal 40–70
pub const THRESHOLDS: [(&str, SensorThreshold); 4] = [
    (
        "temperature",
        SensorThreshold { min: 18.0, max: 28.0, optimal_min: 20.0, optimal_max: 25.0 },
    ),
    (
        "humidity",
        SensorThreshold { min: 30.0, max: 70.0, optimal_min: 40.0, optimal_max: 60.0 },
    ),
    (
        "light_intensity",
        SensorThreshold { min: 200.0, max: 2000.0, optimal_min: 500.0, optimal_max: 1500.0 },
    ),
    (
        "soil_moisture",
        SensorThreshold { min: 20.0, max: 80.0, optimal_min: 40.0, optimal_max: 70.0 },
    ),
];

pub fn threshold_for(sensor: &str) -> Option<SensorThreshold> {
    THRESHOLDS
        .iter()
        .find(|(name, _)| *name == sensor)
        .map(|(_, threshold)| *threshold)
}

// ── Sensor readings (mock) ────────────────────────────────────────────────────

/// A comfortable living-room reading: everything optimal except slightly
/// dry soil.
pub fn healthy_readings() -> Value {
    json!({
        "temperature": 22.5,
        "humidity": 45.0,
        "light_intensity": 800.0,
        "soil_moisture": 35.0
    })
}

/// A plant left on a cold windowsill with the heating off.
pub fn stressed_readings() -> Value {
    json!({
        "temperature": 14.0,
        "humidity": 25.0,
        "light_intensity": 2400.0,
        "soil_moisture": 18.0
    })
}

// ── Knowledge base (mock) ─────────────────────────────────────────────────────

/// One care-guide document.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub keywords: &'static [&'static str],
}

pub const KNOWLEDGE_BASE: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        id: "kb-watering",
        title: "Watering indoor plants",
        content: "Water when the top 2-3 cm of soil is dry. Overwatering is the most common \
                  cause of root rot; always use pots with drainage holes.",
        keywords: &["water", "watering", "overwatering", "dry", "soil", "root", "rot"],
    },
    KnowledgeEntry {
        id: "kb-yellow-leaves",
        title: "Why leaves turn yellow",
        content: "Yellowing lower leaves usually mean overwatering or nitrogen deficiency. \
                  Yellowing with crispy edges points to low humidity or underwatering.",
        keywords: &["yellow", "yellowing", "leaves", "leaf", "nitrogen", "humidity"],
    },
    KnowledgeEntry {
        id: "kb-light",
        title: "Light requirements",
        content: "Most foliage plants prefer bright indirect light of 500-1500 lux. Direct \
                  afternoon sun scorches leaves; too little light causes leggy growth.",
        keywords: &["light", "sun", "sunlight", "window", "leggy", "scorch", "lux"],
    },
    KnowledgeEntry {
        id: "kb-repotting",
        title: "Repotting",
        content: "Repot in spring when roots circle the pot. Choose a pot 2-5 cm wider and \
                  fresh, well-draining mix.",
        keywords: &["repot", "repotting", "pot", "roots", "spring", "soil"],
    },
    KnowledgeEntry {
        id: "kb-monstera",
        title: "Monstera deliciosa care",
        content: "Monstera likes 20-25 °C, humidity above 50 %, and a moss pole to climb. \
                  Leaves without splits usually mean insufficient light.",
        keywords: &["monstera", "split", "moss", "pole", "climb", "tropical"],
    },
    KnowledgeEntry {
        id: "kb-temperature",
        title: "Temperature stress",
        content: "Below 15 °C tropical plants stop growing and may drop leaves. Keep them \
                  away from drafts, radiators and cold windowsills in winter.",
        keywords: &["temperature", "cold", "winter", "draft", "heat", "radiator", "drop"],
    },
];

// ── Search corpus (mock) ──────────────────────────────────────────────────────

/// One canned web search hit.
#[derive(Debug, Clone, Copy)]
pub struct SearchEntry {
    pub title: &'static str,
    pub url: &'static str,
    pub content: &'static str,
    pub keywords: &'static [&'static str],
}

pub const SEARCH_CORPUS: &[SearchEntry] = &[
    SearchEntry {
        title: "Houseplant trends for the coming year",
        url: "https://garden.example.com/trends",
        content: "Variegated cultivars, self-watering planters and smart soil sensors lead \
                  this year's indoor gardening trends.",
        keywords: &["trend", "trends", "latest", "popular", "new", "year"],
    },
    SearchEntry {
        title: "Study: indoor plants and air quality",
        url: "https://research.example.org/air-quality",
        content: "Recent chamber studies find that houseplants remove volatile compounds, \
                  but realistic room effects are small compared with ventilation.",
        keywords: &["research", "study", "air", "quality", "purify", "science"],
    },
    SearchEntry {
        title: "Smart plant sensors compared",
        url: "https://tech.example.com/plant-sensors",
        content: "Soil moisture and light sensors now report to phone apps; accuracy varies \
                  widely between capacitive and resistive probes.",
        keywords: &["sensor", "sensors", "smart", "app", "device", "iot"],
    },
    SearchEntry {
        title: "Pest alert: fungus gnats in overwatered pots",
        url: "https://garden.example.com/fungus-gnats",
        content: "Gardeners report more fungus gnats this season; letting soil dry out and \
                  using sticky traps is the recommended first response.",
        keywords: &["pest", "pests", "gnats", "bugs", "insects", "news"],
    },
];
