pub mod candidate;
pub mod clustering;
pub mod engine;
pub mod prompts;
pub mod scoring;
pub mod summary;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod translator;

pub use candidate::{PredictionBatch, PredictionCandidate, ValidatedCandidate};
pub use clustering::{cluster_reports, DEFAULT_CLUSTER_RADIUS_M};
pub use engine::{EngineConfig, PredictiveEngine};
pub use scoring::{derive_urgency, risk_score, ConfidenceBand};
pub use summary::{summarize, PredictionSummary};
pub use translator::{Translator, TranslatorConfig};
