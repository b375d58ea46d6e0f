use std::collections::BTreeMap;

use serde::Serialize;

use vigil_common::{HazardType, Prediction, UrgencyLevel};

use crate::scoring::ConfidenceBand;

/// Confidence at or above this counts as high confidence.
pub const HIGH_CONFIDENCE: f64 = 70.0;

/// Counts for dashboard headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub total_predictions: usize,
    pub high_confidence: usize,
    pub critical_urgency: usize,
    pub by_type: BTreeMap<HazardType, usize>,
    pub by_urgency: BTreeMap<UrgencyLevel, usize>,
    pub by_confidence_band: BTreeMap<ConfidenceBand, usize>,
}

pub fn summarize(predictions: &[Prediction]) -> PredictionSummary {
    let mut summary = PredictionSummary {
        total_predictions: predictions.len(),
        ..Default::default()
    };

    for p in predictions {
        if p.confidence >= HIGH_CONFIDENCE {
            summary.high_confidence += 1;
        }
        if p.urgency_level == UrgencyLevel::Critical {
            summary.critical_urgency += 1;
        }
        *summary.by_type.entry(p.hazard_type).or_insert(0) += 1;
        *summary.by_urgency.entry(p.urgency_level).or_insert(0) += 1;
        *summary
            .by_confidence_band
            .entry(ConfidenceBand::from_confidence(p.confidence))
            .or_insert(0) += 1;
    }

    summary
}
