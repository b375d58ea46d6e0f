use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::info;

use ai_client::StructuredGenerator;
use vigil_common::{centroid, Config, Prediction, Report};
use vigil_context::{AggregatorConfig, ContextAggregator, EnvironmentSource};

use crate::clustering::{cluster_reports, DEFAULT_CLUSTER_RADIUS_M};
use crate::translator::{Translator, TranslatorConfig};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub cluster_radius_m: f64,
    /// Clusters translated at once.
    pub max_concurrent_clusters: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster_radius_m: DEFAULT_CLUSTER_RADIUS_M,
            max_concurrent_clusters: 4,
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            cluster_radius_m: config.cluster_radius_m,
            max_concurrent_clusters: config.max_concurrent_clusters.max(1),
        }
    }
}

/// Reports in, predictions out.
///
/// One run fetches the external context once at the centroid of every
/// report, clusters the reports, and translates clusters concurrently
/// against that shared snapshot. A failing cluster contributes nothing;
/// the run itself never fails.
pub struct PredictiveEngine {
    aggregator: ContextAggregator,
    translator: Translator,
    config: EngineConfig,
}

impl PredictiveEngine {
    pub fn new(aggregator: ContextAggregator, translator: Translator, config: EngineConfig) -> Self {
        Self {
            aggregator,
            translator,
            config,
        }
    }

    /// Wire every stage from one [`Config`].
    pub fn from_config(
        config: &Config,
        source: Arc<dyn EnvironmentSource>,
        generator: Arc<dyn StructuredGenerator>,
    ) -> Self {
        Self::new(
            ContextAggregator::new(source, AggregatorConfig::from(config)),
            Translator::new(generator, TranslatorConfig::from(config)),
            EngineConfig::from(config),
        )
    }

    pub async fn generate_predictions(
        &self,
        reports: &[Report],
        country: Option<&str>,
    ) -> Vec<Prediction> {
        if reports.is_empty() {
            return Vec::new();
        }

        let center = centroid(reports);
        let context = self
            .aggregator
            .fetch_context(center.lat, center.lng, country)
            .await;

        let clusters = cluster_reports(reports, self.config.cluster_radius_m);
        info!(
            reports = reports.len(),
            clusters = clusters.len(),
            lat = center.lat,
            lng = center.lng,
            "Translating clusters"
        );

        let context = &context;
        let per_cluster: Vec<Vec<Prediction>> = stream::iter(clusters.iter().map(|cluster| {
            self.translator.translate(cluster, context)
        }))
        .buffer_unordered(self.config.max_concurrent_clusters.max(1))
        .collect()
        .await;

        let predictions: Vec<Prediction> = per_cluster.into_iter().flatten().collect();
        info!(
            clusters = clusters.len(),
            predictions = predictions.len(),
            "Prediction run complete"
        );
        predictions
    }
}
