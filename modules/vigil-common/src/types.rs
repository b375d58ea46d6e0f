use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::VigilError;
use crate::geo::{GeoCoord, Locatable};

// --- Reports (input) ---

/// A community hazard report as handed to the engine by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 1 (minor) to 5 (severe).
    pub severity_level: u8,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default = "default_credibility")]
    pub credibility_score: f64,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_credibility() -> f64 {
    0.7
}

fn default_status() -> String {
    "active".to_string()
}

impl Report {
    /// Summary shown to the model; falls back to the raw description.
    pub fn summary(&self) -> &str {
        self.ai_summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.description)
    }

    /// Ingestion check. The engine itself assumes well-formed coordinates.
    pub fn validate(&self) -> Result<(), VigilError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(VigilError::Validation(format!(
                "report {}: latitude {} out of range",
                self.id, self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(VigilError::Validation(format!(
                "report {}: longitude {} out of range",
                self.id, self.longitude
            )));
        }
        if !(1..=5).contains(&self.severity_level) {
            return Err(VigilError::Validation(format!(
                "report {}: severity_level {} not in 1..=5",
                self.id, self.severity_level
            )));
        }
        Ok(())
    }
}

impl Locatable for Report {
    fn coord(&self) -> GeoCoord {
        GeoCoord::new(self.latitude, self.longitude)
    }
}

// --- Enums ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Flood,
    Fire,
    Traffic,
    Environmental,
    Electrical,
    Medical,
    Earthquake,
    Hazmat,
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardType::Flood => write!(f, "flood"),
            HazardType::Fire => write!(f, "fire"),
            HazardType::Traffic => write!(f, "traffic"),
            HazardType::Environmental => write!(f, "environmental"),
            HazardType::Electrical => write!(f, "electrical"),
            HazardType::Medical => write!(f, "medical"),
            HazardType::Earthquake => write!(f, "earthquake"),
            HazardType::Hazmat => write!(f, "hazmat"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyLevel::Low => write!(f, "low"),
            UrgencyLevel::Medium => write!(f, "medium"),
            UrgencyLevel::High => write!(f, "high"),
            UrgencyLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeismicityLevel {
    #[default]
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl SeismicityLevel {
    /// Level from the count and mean magnitude of nearby events.
    pub fn assess(event_count: usize, average_magnitude: f64) -> Self {
        if event_count > 10 || average_magnitude > 6.0 {
            SeismicityLevel::VeryHigh
        } else if event_count > 5 || average_magnitude > 5.0 {
            SeismicityLevel::High
        } else if event_count > 2 || average_magnitude > 4.0 {
            SeismicityLevel::Moderate
        } else {
            SeismicityLevel::Low
        }
    }
}

// --- External context ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// °C
    pub temperature: f64,
    /// Relative humidity, %
    pub humidity: f64,
    /// mm
    pub precipitation: f64,
    /// km/h
    pub wind_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_gusts: Option<f64>,
    pub conditions: String,
    /// hPa
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            humidity: 60.0,
            precipitation: 0.0,
            wind_speed: 5.0,
            wind_gusts: None,
            conditions: "clear".to_string(),
            pressure: 1013.0,
            cloud_cover: Some(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQuality {
    /// 1 (good) to 5 (hazardous).
    pub aqi: u8,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub co: f64,
}

impl Default for AirQuality {
    fn default() -> Self {
        Self {
            aqi: 2,
            pm25: 15.0,
            pm10: 30.0,
            no2: 0.0,
            o3: 0.0,
            so2: 0.0,
            co: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeEvent {
    pub id: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeismicRisk {
    pub seismicity_level: SeismicityLevel,
    pub event_count: usize,
    pub average_magnitude: f64,
    pub recent_events: Vec<EarthquakeEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterEvent {
    pub id: String,
    pub title: String,
    pub event_type: String,
    pub status: String,
    pub date: String,
    pub location: String,
    pub country: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disasters {
    pub events: Vec<DisasterEvent>,
    pub nearby_events: Vec<DisasterEvent>,
    pub event_types: BTreeMap<String, usize>,
}

impl Disasters {
    /// Keep the five most recent as headline events and count all by type.
    pub fn from_events(nearby_events: Vec<DisasterEvent>) -> Self {
        let mut event_types = BTreeMap::new();
        for event in &nearby_events {
            *event_types.entry(event.event_type.clone()).or_insert(0) += 1;
        }
        Self {
            events: nearby_events.iter().take(5).cloned().collect(),
            nearby_events,
            event_types,
        }
    }
}

/// Environmental snapshot shared by every cluster of one engine run.
/// Every field is populated; missing data is replaced by the neutral default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalContext {
    pub weather: Weather,
    pub air_quality: AirQuality,
    pub seismic_risk: SeismicRisk,
    pub disasters: Disasters,
}

// --- Predictions (output) ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectedArea {
    pub lat: f64,
    pub lng: f64,
    /// meters
    pub radius: f64,
}

/// A materialized hazard forecast for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub description: String,
    /// Capped at 95.
    pub confidence: f64,
    pub affected_area: AffectedArea,
    pub expires_at: DateTime<Utc>,
    pub source_reports: Vec<String>,
    pub cluster_size: usize,
    pub reasoning: String,
    pub weather_influence: String,
    pub urgency_level: UrgencyLevel,
    pub external_context: ExternalContext,
    pub generated_at: DateTime<Utc>,
}

impl Prediction {
    /// Expiry is advisory; consumers decide whether to drop expired zones.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
