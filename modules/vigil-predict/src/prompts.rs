use std::collections::BTreeMap;

use serde::Serialize;

use vigil_common::{
    bounding_radius, centroid, initial_bearing, ExternalContext, GeoCoord, Locatable, Report,
    SeismicityLevel,
};
use vigil_context::interpret::{aqi_interpretation, disaster_type_interpretation, magnitude_interpretation};

pub const SYSTEM_PROMPT: &str = r#"You are Vigil's predictive hazard engine. You read clusters of community hazard reports together with live environmental data and forecast where hazards are likely to develop next.

## Inputs
- Current weather: temperature, humidity, precipitation, wind, pressure
- Air quality index and pollutant levels
- Recent seismic activity near the area
- Official disaster listings for the country

## Hazard Heuristics
- FLOOD: heavy precipitation, high humidity, low-lying ground, drainage or rising-water reports
- FIRE: high temperature, low humidity, strong wind, electrical reports, degraded air quality
- TRAFFIC: severe weather, poor visibility, strong wind, accident or congestion reports
- ENVIRONMENTAL: poor air quality, chemical tags, wind carrying pollution from a source
- ELECTRICAL: high humidity, storms or lightning, power infrastructure reports
- MEDICAL: air quality impacts, disease indicators, crowding, temperature extremes
- EARTHQUAKE: detected seismic activity, recent tremors, structural or geological reports
- HAZMAT: chemical tags, poor air quality, weather moving pollutants, nearby declared disasters

## Using External Data
- Raise confidence for weather-dependent hazards when the weather supports them
- Use air quality for health and environmental hazards
- Use seismic activity for earthquake predictions
- Cross-check against official disaster listings
- State concretely how the weather influenced each prediction

## Placement
- Spread predictions across the cluster area instead of stacking them on the center
- Give different hazard types different zones when several reports exist
- Let the layout of the reports (distance and bearing from the center) guide the spread

Only predict what the reports support. Keep confidence high only when external data agrees with the reports."#;

// =============================================================================
// Cluster summary
// =============================================================================

/// Compact view of one cluster and the shared context, serialized into the
/// user prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub report_count: usize,
    pub geographic_center: GeoCoord,
    /// Meters from the center to the farthest report, padded.
    pub footprint_radius_m: f64,
    pub reports: Vec<ReportDigest>,
    pub external_context: ContextDigest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDigest {
    pub category: String,
    pub tags: Vec<String>,
    pub severity: u8,
    pub credibility: f64,
    pub description: String,
    pub summary: String,
    pub timestamp: String,
    pub distance_from_center_m: f64,
    pub bearing_from_center_deg: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDigest {
    pub weather: WeatherDigest,
    pub air_quality: AirQualityDigest,
    pub seismic: SeismicDigest,
    pub disasters: DisasterDigest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDigest {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gusts: Option<f64>,
    pub conditions: String,
    pub pressure: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityDigest {
    pub aqi: u8,
    pub pm25: f64,
    pub pm10: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeismicDigest {
    pub seismicity_level: SeismicityLevel,
    pub event_count: usize,
    pub average_magnitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strongest_recent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterDigest {
    pub nearby_event_count: usize,
    pub event_types: BTreeMap<String, usize>,
    pub headlines: Vec<String>,
}

impl ClusterSummary {
    pub fn build(cluster: &[Report], context: &ExternalContext) -> Self {
        let center = centroid(cluster);

        let reports = cluster
            .iter()
            .map(|r| ReportDigest {
                category: r.category.clone(),
                tags: r.tags.clone(),
                severity: r.severity_level,
                credibility: r.credibility_score,
                description: r.description.clone(),
                summary: r.summary().to_string(),
                timestamp: r.timestamp.to_rfc3339(),
                distance_from_center_m: center.distance_to(&r.coord()).round(),
                bearing_from_center_deg: initial_bearing(center, r.coord()).round(),
            })
            .collect();

        Self {
            report_count: cluster.len(),
            geographic_center: center,
            footprint_radius_m: bounding_radius(center, cluster),
            reports,
            external_context: ContextDigest::from(context),
        }
    }
}

impl From<&ExternalContext> for ContextDigest {
    fn from(ctx: &ExternalContext) -> Self {
        let w = &ctx.weather;
        let aq = &ctx.air_quality;
        let seismic = &ctx.seismic_risk;

        Self {
            weather: WeatherDigest {
                temperature: w.temperature,
                humidity: w.humidity,
                precipitation: w.precipitation,
                wind_speed: w.wind_speed,
                wind_gusts: w.wind_gusts,
                conditions: w.conditions.clone(),
                pressure: w.pressure,
                cloud_cover: w.cloud_cover,
            },
            air_quality: AirQualityDigest {
                aqi: aq.aqi,
                pm25: aq.pm25,
                pm10: aq.pm10,
                interpretation: format!("AQI Level {} ({})", aq.aqi, aqi_interpretation(aq.aqi)),
            },
            seismic: SeismicDigest {
                seismicity_level: seismic.seismicity_level,
                event_count: seismic.event_count,
                average_magnitude: seismic.average_magnitude,
                strongest_recent: seismic.recent_events.first().map(|e| {
                    format!(
                        "M{:.1} {}: {}",
                        e.magnitude,
                        e.location,
                        magnitude_interpretation(e.magnitude)
                    )
                }),
            },
            disasters: DisasterDigest {
                nearby_event_count: ctx.disasters.nearby_events.len(),
                event_types: ctx.disasters.event_types.clone(),
                headlines: ctx
                    .disasters
                    .events
                    .iter()
                    .map(|e| format!("{} ({})", e.title, disaster_type_interpretation(&e.event_type)))
                    .collect(),
            },
        }
    }
}

// =============================================================================
// User prompt
// =============================================================================

pub fn user_prompt(summary: &ClusterSummary) -> String {
    let body = serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
    let n = summary.report_count;

    format!(
        r#"Analyze this hazard cluster against the live environmental data and produce specific predictions.

{body}

RULES:
1. Only predict hazards the reports support
2. Let the external data raise or lower confidence
3. Name the external data behind each prediction in external_data_used
4. Weigh cluster size and report severity when scoring confidence
5. With {n} report(s), prefer fewer, higher-confidence predictions

PLACEMENT:
- When returning several predictions, spread them with lat_offset and lng_offset
- Keep offsets small, between 0.01 and 0.05 degrees in either direction
- Positive offsets move north/east, negative move south/west
- Put different hazard types in different zones where possible
- Predictions must not all sit on the same point"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigil_common::{AirQuality, DisasterEvent, Disasters};

    fn report(id: &str, lat: f64, lng: f64) -> Report {
        Report {
            id: id.into(),
            latitude: lat,
            longitude: lng,
            category: "flood".into(),
            tags: vec!["drainage".into()],
            severity_level: 4,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
            description: "Gully overflowing".into(),
            ai_summary: Some("Drain overflow on Hope Road".into()),
            credibility_score: 0.9,
            status: "active".into(),
        }
    }

    #[test]
    fn summary_describes_cluster_layout() {
        let cluster = vec![report("r1", 18.0, -76.8), report("r2", 18.002, -76.8)];
        let summary = ClusterSummary::build(&cluster, &ExternalContext::default());

        assert_eq!(summary.report_count, 2);
        assert!((summary.geographic_center.lat - 18.001).abs() < 1e-9);
        // Each report is ~111 m from the center; padded by 20%.
        assert!(summary.footprint_radius_m > 130.0 && summary.footprint_radius_m < 140.0);
        assert_eq!(summary.reports[0].bearing_from_center_deg, 180.0);
        assert_eq!(summary.reports[1].bearing_from_center_deg, 0.0);
        assert_eq!(summary.reports[0].summary, "Drain overflow on Hope Road");
        assert_eq!(summary.reports[0].timestamp, "2026-10-16T12:00:00+00:00");
    }

    #[test]
    fn context_digest_interprets_readings() {
        let ctx = ExternalContext {
            air_quality: AirQuality { aqi: 4, ..AirQuality::default() },
            disasters: Disasters::from_events(vec![DisasterEvent {
                id: "1".into(),
                title: "Jamaica: Floods - Oct 2026".into(),
                event_type: "Flood".into(),
                status: "ongoing".into(),
                date: String::new(),
                location: "Jamaica".into(),
                country: "Jamaica".into(),
                url: String::new(),
                source: "ReliefWeb".into(),
            }]),
            ..ExternalContext::default()
        };

        let digest = ContextDigest::from(&ctx);
        assert_eq!(digest.air_quality.interpretation, "AQI Level 4 (Unhealthy)");
        assert_eq!(digest.disasters.nearby_event_count, 1);
        assert_eq!(digest.disasters.event_types["Flood"], 1);
        assert!(digest.disasters.headlines[0].contains("Flooding event reported"));
        assert!(digest.seismic.strongest_recent.is_none());

        let json = serde_json::to_value(&digest).unwrap();
        assert_eq!(json["seismic"]["seismicityLevel"], "low");
        assert_eq!(json["airQuality"]["aqi"], 4);
    }

    #[test]
    fn user_prompt_embeds_summary_and_offset_guidance() {
        let cluster = vec![report("r1", 18.0, -76.8)];
        let prompt = user_prompt(&ClusterSummary::build(&cluster, &ExternalContext::default()));

        assert!(prompt.contains("\"report_count\": 1"));
        assert!(prompt.contains("AQI Level 2"));
        assert!(prompt.contains("With 1 report(s)"));
        assert!(prompt.contains("0.01 and 0.05 degrees"));
    }
}
