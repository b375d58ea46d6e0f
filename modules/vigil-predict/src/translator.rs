use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, error, info, warn};

use ai_client::{generate_typed, AiError, StructuredGenerator};
use vigil_common::{Config, ExternalContext, HazardType, Prediction, Report, VigilError};

use crate::candidate::{PredictionBatch, ValidatedCandidate};
use crate::prompts::{user_prompt, ClusterSummary, SYSTEM_PROMPT};

const ID_SUFFIX_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Budget for a single generation call.
    pub timeout: Duration,
    /// Total calls per cluster, first attempt included.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each further failure.
    pub backoff: Duration,
    pub temperature: f32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 1,
            backoff: Duration::from_millis(500),
            temperature: 0.3,
        }
    }
}

impl From<&Config> for TranslatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.generation_timeout,
            max_attempts: config.generation_max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Turns one cluster plus the shared context into bounded predictions.
pub struct Translator {
    generator: Arc<dyn StructuredGenerator>,
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(generator: Arc<dyn StructuredGenerator>, config: TranslatorConfig) -> Self {
        Self { generator, config }
    }

    /// Predictions for `cluster`. Any failure is logged and yields `[]`.
    pub async fn translate(&self, cluster: &[Report], context: &ExternalContext) -> Vec<Prediction> {
        if cluster.is_empty() {
            return Vec::new();
        }

        let summary = ClusterSummary::build(cluster, context);
        let center = summary.geographic_center;
        let user = user_prompt(&summary);
        let lead = cluster[0].id.as_str();

        let candidates = match self.generate_with_retry(&user, lead).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(
                    cluster = lead,
                    size = cluster.len(),
                    provider = self.generator.provider(),
                    error = %e,
                    "Prediction generation failed, cluster yields nothing"
                );
                return Vec::new();
            }
        };

        let now = Utc::now();
        let predictions: Vec<Prediction> = candidates
            .into_iter()
            .filter_map(|c| {
                if let Some(used) = c.external_data_used() {
                    debug!(cluster = lead, hazard = %c.hazard_type(), external_data = used, "Candidate sources");
                }
                let hazard = c.hazard_type();
                match c.materialize(prediction_id(hazard, now), center, cluster, context, now) {
                    Ok(prediction) => Some(prediction),
                    Err(e) => {
                        warn!(cluster = lead, hazard = %hazard, error = %e, "Dropping unplaceable prediction");
                        None
                    }
                }
            })
            .collect();

        info!(
            cluster = lead,
            size = cluster.len(),
            predictions = predictions.len(),
            "Cluster translated"
        );
        predictions
    }

    async fn generate_with_retry(
        &self,
        user: &str,
        lead: &str,
    ) -> Result<Vec<ValidatedCandidate>, VigilError> {
        let attempts = self.config.max_attempts.max(1);
        let mut delay = self.config.backoff;
        let mut last_err = VigilError::Generation("no attempt made".into());

        for attempt in 1..=attempts {
            match self.generate_once(user).await {
                Ok(candidates) => return Ok(candidates),
                Err(e) => {
                    if attempt < attempts {
                        warn!(
                            cluster = lead,
                            attempt,
                            max_attempts = attempts,
                            retry_in_ms = delay.as_millis() as u64,
                            error = %e,
                            "Generation attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2);
                    }
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn generate_once(&self, user: &str) -> Result<Vec<ValidatedCandidate>, VigilError> {
        let call = generate_typed::<PredictionBatch>(
            self.generator.as_ref(),
            SYSTEM_PROMPT,
            user,
            self.config.temperature,
        );

        let batch = tokio::time::timeout(self.config.timeout, call)
            .await
            .unwrap_or(Err(AiError::Timeout(self.config.timeout)))
            .map_err(|e| VigilError::Generation(e.to_string()))?;

        batch.validate()
    }
}

/// `pred_<type>_<unix millis>_<5 base36 chars>`
pub fn prediction_id(hazard: HazardType, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("pred_{hazard}_{}_{suffix}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{flood_candidate, test_report, ScriptedGenerator};
    use serde_json::json;

    fn fast() -> TranslatorConfig {
        TranslatorConfig {
            timeout: Duration::from_millis(100),
            max_attempts: 1,
            backoff: Duration::from_millis(1),
            temperature: 0.3,
        }
    }

    #[test]
    fn id_has_expected_shape() {
        let now = Utc::now();
        let id = prediction_id(HazardType::Hazmat, now);
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts[0], "pred");
        assert_eq!(parts[1], "hazmat");
        assert_eq!(parts[2], now.timestamp_millis().to_string());
        assert_eq!(parts[3].len(), 5);
        assert!(parts[3].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn materializes_candidates_at_cluster_center() {
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({
            "predictions": [flood_candidate(80)]
        })));
        let translator = Translator::new(generator.clone(), fast());

        let cluster = vec![test_report("r1", 18.0, -76.8), test_report("r2", 18.002, -76.8)];
        let predictions = translator.translate(&cluster, &ExternalContext::default()).await;

        assert_eq!(predictions.len(), 1);
        let p = &predictions[0];
        assert!((p.affected_area.lat - 18.001).abs() < 1e-9);
        assert_eq!(p.source_reports, vec!["r1", "r2"]);
        assert_eq!(p.cluster_size, 2);
        assert!(p.id.starts_with("pred_flood_"));
        assert_eq!(generator.calls(), 1);

        let request = generator.last_request().unwrap();
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.schema_name, "PredictionBatch");
        assert!(request.system.contains("FLOOD"));
    }

    #[tokio::test]
    async fn confidence_above_cap_is_clamped() {
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({
            "predictions": [flood_candidate(99)]
        })));
        let translator = Translator::new(generator, fast());

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert_eq!(predictions[0].confidence, 95.0);
    }

    #[tokio::test]
    async fn invalid_payload_degrades_to_empty() {
        let mut bad = flood_candidate(80);
        bad["radius_meters"] = json!(20_000);
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({
            "predictions": [flood_candidate(80), bad]
        })));
        let translator = Translator::new(generator, fast());

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn generator_error_degrades_to_empty() {
        let generator = Arc::new(ScriptedGenerator::new().fail("upstream 503"));
        let translator = Translator::new(generator.clone(), fast());

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let generator = Arc::new(ScriptedGenerator::new().stall());
        let translator = Translator::new(generator, fast());

        let started = std::time::Instant::now();
        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn stalled_attempt_reports_timeout() {
        let generator = Arc::new(ScriptedGenerator::new().stall());
        let translator = Translator::new(generator, fast());

        let err = translator.generate_once("cluster").await.unwrap_err();
        assert!(matches!(err, VigilError::Generation(_)));
        assert!(err.to_string().contains("timed out after 100ms"), "{err}");
    }

    #[tokio::test]
    async fn out_of_bounds_offsets_degrade_to_empty() {
        let mut wild = flood_candidate(80);
        wild["lat_offset"] = json!(500);
        wild["lng_offset"] = json!(-400);
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({ "predictions": [wild] })));
        let translator = Translator::new(generator, fast());

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn offset_past_the_pole_drops_only_that_candidate() {
        let mut north = flood_candidate(80);
        north["lat_offset"] = json!(0.9);
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({
            "predictions": [flood_candidate(70), north]
        })));
        let translator = Translator::new(generator, fast());

        let predictions = translator
            .translate(&[test_report("r1", 89.5, 0.0)], &ExternalContext::default())
            .await;
        assert_eq!(predictions.len(), 1);
        assert!(predictions[0].affected_area.lat <= 90.0);
    }

    #[tokio::test]
    async fn missing_predictions_field_degrades_to_empty() {
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({})));
        let translator = Translator::new(generator.clone(), fast());

        assert!(translator.generate_once("cluster").await.is_err());
        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
    }

    #[tokio::test]
    async fn retries_up_to_max_attempts() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .fail("rate limited")
                .fail("rate limited")
                .respond(json!({ "predictions": [flood_candidate(70)] })),
        );
        let translator = Translator::new(
            generator.clone(),
            TranslatorConfig {
                max_attempts: 3,
                ..fast()
            },
        );

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert_eq!(predictions.len(), 1);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .fail("down")
                .fail("down")
                .respond(json!({ "predictions": [flood_candidate(70)] })),
        );
        let translator = Translator::new(
            generator.clone(),
            TranslatorConfig {
                max_attempts: 2,
                ..fast()
            },
        );

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_valid_answer() {
        let generator = Arc::new(ScriptedGenerator::new().respond(json!({ "predictions": [] })));
        let translator = Translator::new(generator, fast());

        let predictions = translator
            .translate(&[test_report("r1", 18.0, -76.8)], &ExternalContext::default())
            .await;
        assert!(predictions.is_empty());
    }
}
