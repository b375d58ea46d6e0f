use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vigil_common::{
    AffectedArea, ExternalContext, GeoCoord, HazardType, Prediction, Report, UrgencyLevel,
    VigilError,
};

/// Upper bound applied to model confidence when a prediction is materialized.
pub const MAX_CONFIDENCE: f64 = 95.0;

const CONFIDENCE_RANGE: (f64, f64) = (30.0, 100.0);
const RADIUS_RANGE_M: (f64, f64) = (100.0, 5000.0);
const EXPIRES_HOURS_RANGE: (f64, f64) = (1.0, 24.0);
/// Furthest a prediction may sit from its cluster center, in degrees per axis.
const OFFSET_RANGE_DEG: (f64, f64) = (-1.0, 1.0);
const MAX_DESCRIPTION_CHARS: usize = 150;
const MAX_REASONING_CHARS: usize = 300;
const MAX_WEATHER_INFLUENCE_CHARS: usize = 150;
const MAX_EXTERNAL_DATA_CHARS: usize = 200;

// =============================================================================
// Model output
// =============================================================================

/// One hazard forecast as the model returns it, before any checks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionCandidate {
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    /// Short, specific description of the predicted hazard.
    #[schemars(length(max = 150))]
    pub description: String,
    /// Certainty from 30 to 100.
    #[schemars(range(min = 30, max = 100))]
    pub confidence: f64,
    #[schemars(range(min = 100, max = 5000))]
    pub radius_meters: f64,
    /// Hours from now until the prediction lapses.
    #[schemars(range(min = 1, max = 24))]
    pub expires_hours: f64,
    #[schemars(length(max = 300))]
    pub reasoning: String,
    /// How current weather shaped this prediction.
    #[schemars(length(max = 150))]
    pub weather_influence: String,
    pub urgency_level: UrgencyLevel,
    /// Which external signals were used, if any.
    #[serde(default)]
    #[schemars(length(max = 200))]
    pub external_data_used: Option<String>,
    /// Degrees north (+) or south (-) of the cluster center.
    #[serde(default)]
    #[schemars(range(min = -1, max = 1))]
    pub lat_offset: f64,
    /// Degrees east (+) or west (-) of the cluster center.
    #[serde(default)]
    #[schemars(range(min = -1, max = 1))]
    pub lng_offset: f64,
}

/// Top-level structured answer for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionBatch {
    pub predictions: Vec<PredictionCandidate>,
}

impl PredictionBatch {
    /// Check every candidate. One bad candidate rejects the whole batch.
    pub fn validate(self) -> Result<Vec<ValidatedCandidate>, VigilError> {
        self.predictions
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                c.validate()
                    .map_err(|e| VigilError::Validation(format!("prediction {i}: {e}")))
            })
            .collect()
    }
}

impl PredictionCandidate {
    pub fn validate(self) -> Result<ValidatedCandidate, VigilError> {
        check_range("confidence", self.confidence, CONFIDENCE_RANGE)?;
        check_range("radius_meters", self.radius_meters, RADIUS_RANGE_M)?;
        check_range("expires_hours", self.expires_hours, EXPIRES_HOURS_RANGE)?;
        check_len("description", &self.description, MAX_DESCRIPTION_CHARS)?;
        check_len("reasoning", &self.reasoning, MAX_REASONING_CHARS)?;
        check_len("weather_influence", &self.weather_influence, MAX_WEATHER_INFLUENCE_CHARS)?;
        if let Some(used) = &self.external_data_used {
            check_len("external_data_used", used, MAX_EXTERNAL_DATA_CHARS)?;
        }
        check_range("lat_offset", self.lat_offset, OFFSET_RANGE_DEG)?;
        check_range("lng_offset", self.lng_offset, OFFSET_RANGE_DEG)?;
        Ok(ValidatedCandidate { inner: self })
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<(), VigilError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(VigilError::Validation(format!(
            "{field} {value} outside {min}..={max}"
        )))
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), VigilError> {
    let len = value.chars().count();
    if len <= max {
        Ok(())
    } else {
        Err(VigilError::Validation(format!(
            "{field} is {len} chars, limit {max}"
        )))
    }
}

// =============================================================================
// Validated
// =============================================================================

/// A candidate whose every field is inside its documented bounds.
/// Only obtainable through [`PredictionCandidate::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedCandidate {
    inner: PredictionCandidate,
}

impl ValidatedCandidate {
    pub fn hazard_type(&self) -> HazardType {
        self.inner.hazard_type
    }

    /// Confidence with the materialization cap applied.
    pub fn confidence(&self) -> f64 {
        self.inner.confidence.min(MAX_CONFIDENCE)
    }

    pub fn external_data_used(&self) -> Option<&str> {
        self.inner.external_data_used.as_deref()
    }

    /// Turn into a positioned, time-bounded [`Prediction`].
    ///
    /// Fails when the offset pushes the position off the globe, which can
    /// only happen for clusters near a pole or the antimeridian.
    pub fn materialize(
        self,
        id: String,
        center: GeoCoord,
        cluster: &[Report],
        context: &ExternalContext,
        now: DateTime<Utc>,
    ) -> Result<Prediction, VigilError> {
        let confidence = self.confidence();
        let c = self.inner;
        let position = center.offset(c.lat_offset, c.lng_offset);
        if !position.is_valid() {
            return Err(VigilError::Validation(format!(
                "position ({}, {}) is off the globe",
                position.lat, position.lng
            )));
        }
        let ttl = Duration::milliseconds((c.expires_hours * 3_600_000.0).round() as i64);

        Ok(Prediction {
            id,
            hazard_type: c.hazard_type,
            description: c.description,
            confidence,
            affected_area: AffectedArea {
                lat: position.lat,
                lng: position.lng,
                radius: c.radius_meters,
            },
            expires_at: now + ttl,
            source_reports: cluster.iter().map(|r| r.id.clone()).collect(),
            cluster_size: cluster.len(),
            reasoning: c.reasoning,
            weather_influence: c.weather_influence,
            urgency_level: c.urgency_level,
            external_context: context.clone(),
            generated_at: now,
        })
    }
}
