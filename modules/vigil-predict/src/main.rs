use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::claude::DEFAULT_CLAUDE_MODEL;
use ai_client::mistral::DEFAULT_MISTRAL_MODEL;
use ai_client::{Claude, Mistral, StructuredGenerator};
use vigil_common::{within_radius, Config, GeoCoord, LlmProvider, Prediction, Report, UrgencyLevel};
use vigil_context::LiveSources;
use vigil_predict::{derive_urgency, risk_score, summarize, ConfidenceBand, PredictionSummary, PredictiveEngine};

/// Support weight assumed for external signals when ranking.
const DEFAULT_EXTERNAL_SUPPORT: f64 = 0.5;

#[derive(Parser)]
#[command(name = "vigil-predict", about = "Generate hazard predictions from community reports")]
struct Cli {
    /// JSON array of reports. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Country name used for disaster listings.
    #[arg(long)]
    country: Option<String>,

    /// Only use reports near this latitude (requires --lng).
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Only use reports near this longitude (requires --lat).
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Radius in meters for --lat/--lng.
    #[arg(long, default_value_t = 5000.0)]
    radius: f64,

    /// Compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,
}

#[derive(Serialize)]
struct Output {
    predictions: Vec<RankedPrediction>,
    summary: PredictionSummary,
    metadata: Metadata,
}

#[derive(Serialize)]
struct RankedPrediction {
    #[serde(flatten)]
    prediction: Prediction,
    risk_score: f64,
    confidence_band: &'static str,
    confidence_color: &'static str,
    derived_urgency: UrgencyLevel,
}

#[derive(Serialize)]
struct Metadata {
    report_count: usize,
    filtered_out: usize,
    country: Option<String>,
    provider: String,
    model: String,
    generated_at: chrono::DateTime<Utc>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vigil=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.log_redacted();

    let all_reports = read_reports(cli.input.as_deref())?;
    let reports = match (cli.lat, cli.lng) {
        (Some(lat), Some(lng)) => {
            let nearby: Vec<Report> = within_radius(GeoCoord::new(lat, lng), cli.radius, &all_reports)
                .into_iter()
                .cloned()
                .collect();
            info!(lat, lng, radius_m = cli.radius, kept = nearby.len(), "Filtered reports by radius");
            nearby
        }
        _ => all_reports.clone(),
    };

    let (generator, model) = build_generator(&config)?;
    let provider = generator.provider().to_string();
    let source = Arc::new(LiveSources::from_config(&config)?);
    let engine = PredictiveEngine::from_config(&config, source, generator);

    info!(reports = reports.len(), country = cli.country.as_deref(), "Generating predictions");
    let predictions = engine
        .generate_predictions(&reports, cli.country.as_deref())
        .await;

    let summary = summarize(&predictions);
    let output = Output {
        predictions: rank(predictions, &reports),
        summary,
        metadata: Metadata {
            report_count: reports.len(),
            filtered_out: all_reports.len() - reports.len(),
            country: cli.country,
            provider,
            model,
            generated_at: Utc::now(),
        },
    };

    let json = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{json}");
    Ok(())
}

fn read_reports(path: Option<&std::path::Path>) -> Result<Vec<Report>> {
    let raw = match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read reports from stdin")?;
            buf
        }
    };

    let parsed: Vec<Report> = serde_json::from_str(&raw).context("Reports must be a JSON array")?;

    let mut reports = Vec::with_capacity(parsed.len());
    for report in parsed {
        match report.validate() {
            Ok(()) => reports.push(report),
            Err(e) => warn!(error = %e, "Skipping malformed report"),
        }
    }
    Ok(reports)
}

fn build_generator(config: &Config) -> Result<(Arc<dyn StructuredGenerator>, String)> {
    let key = config.llm_api_key()?;
    let generator: (Arc<dyn StructuredGenerator>, String) = match config.llm_provider {
        LlmProvider::Mistral => {
            let model = config.llm_model.as_deref().unwrap_or(DEFAULT_MISTRAL_MODEL);
            (Arc::new(Mistral::new(key, model)), model.to_string())
        }
        LlmProvider::Claude => {
            let model = config.llm_model.as_deref().unwrap_or(DEFAULT_CLAUDE_MODEL);
            (Arc::new(Claude::new(key, model)), model.to_string())
        }
    };
    Ok(generator)
}

/// Attach display scores and order by descending risk.
fn rank(predictions: Vec<Prediction>, reports: &[Report]) -> Vec<RankedPrediction> {
    let severity: HashMap<&str, u8> = reports
        .iter()
        .map(|r| (r.id.as_str(), r.severity_level))
        .collect();

    let mut ranked: Vec<RankedPrediction> = predictions
        .into_iter()
        .map(|p| {
            let worst = p
                .source_reports
                .iter()
                .filter_map(|id| severity.get(id.as_str()).copied())
                .max()
                .unwrap_or(1);
            let band = ConfidenceBand::from_confidence(p.confidence);
            RankedPrediction {
                risk_score: risk_score(p.confidence, p.urgency_level, p.cluster_size, DEFAULT_EXTERNAL_SUPPORT),
                confidence_band: band.label(),
                confidence_color: band.color(),
                derived_urgency: derive_urgency(p.confidence, p.cluster_size, worst),
                prediction: p,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    ranked
}
