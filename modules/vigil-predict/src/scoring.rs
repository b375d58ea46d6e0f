//! Display-side scoring helpers for predictions and clusters.

use serde::Serialize;

use vigil_common::UrgencyLevel;

fn urgency_multiplier(urgency: UrgencyLevel) -> f64 {
    match urgency {
        UrgencyLevel::Low => 0.5,
        UrgencyLevel::Medium => 1.0,
        UrgencyLevel::High => 1.5,
        UrgencyLevel::Critical => 2.0,
    }
}

/// Composite 0–100 risk for ranking predictions.
///
/// `external_support` is the share of external signals backing the
/// prediction, in `[0, 1]`; values outside are clamped.
pub fn risk_score(
    confidence: f64,
    urgency: UrgencyLevel,
    cluster_size: usize,
    external_support: f64,
) -> f64 {
    let support = external_support.clamp(0.0, 1.0);
    let size_bonus = (cluster_size as f64 * 5.0).min(15.0);
    let score = confidence * 0.5 + urgency_multiplier(urgency) * 10.0 + size_bonus + support * 15.0;
    score.clamp(0.0, 100.0)
}

/// Urgency implied by confidence, cluster size and the worst report severity.
pub fn derive_urgency(confidence: f64, cluster_size: usize, severity: u8) -> UrgencyLevel {
    let score = confidence * 0.5 + cluster_size as f64 * 10.0 + f64::from(severity) * 5.0;
    if score >= 80.0 {
        UrgencyLevel::Critical
    } else if score >= 60.0 {
        UrgencyLevel::High
    } else if score >= 40.0 {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceBand::VeryHigh
        } else if confidence >= 60.0 {
            ConfidenceBand::High
        } else if confidence >= 40.0 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceBand::Low => "Low",
            ConfidenceBand::Moderate => "Moderate",
            ConfidenceBand::High => "High",
            ConfidenceBand::VeryHigh => "Very High",
        }
    }

    /// Map overlay color.
    pub fn color(self) -> &'static str {
        match self {
            ConfidenceBand::Low => "#10b981",
            ConfidenceBand::Moderate => "#eab308",
            ConfidenceBand::High => "#f97316",
            ConfidenceBand::VeryHigh => "#ef4444",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
