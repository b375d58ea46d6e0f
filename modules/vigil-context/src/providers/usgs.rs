use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use vigil_common::{haversine_km, EarthquakeEvent, SeismicRisk, SeismicityLevel, VigilError};

const USGS_FEED_URL: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
const DEFAULT_FEED: &str = "2.5_week.geojson";

/// Events below this magnitude are ignored.
const MIN_MAGNITUDE: f64 = 2.0;
const MAX_RECENT_EVENTS: usize = 5;

/// USGS earthquake summary feed, filtered to a radius around a point.
pub struct UsgsClient {
    client: reqwest::Client,
    base_url: String,
    feed: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: String,
    properties: Properties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    /// Epoch milliseconds.
    time: Option<i64>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lng, lat, depth_km]`
    coordinates: Vec<f64>,
}

impl UsgsClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: USGS_FEED_URL.to_string(),
            feed: DEFAULT_FEED.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Select a different summary feed, e.g. `4.5_month.geojson`.
    pub fn with_feed(mut self, feed: &str) -> Self {
        self.feed = feed.to_string();
        self
    }

    pub async fn seismic_risk(&self, lat: f64, lng: f64, radius_km: f64) -> Result<SeismicRisk> {
        let url = format!("{}/{}", self.base_url, self.feed);
        debug!(lat, lng, radius_km, feed = %self.feed, "USGS feed request");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("USGS request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VigilError::Provider {
                provider: "usgs",
                message: format!("HTTP {status}"),
            }
            .into());
        }

        let collection: FeatureCollection = resp.json().await.context("USGS body was not GeoJSON")?;
        Ok(assess(collection, lat, lng, radius_km))
    }
}

/// Keep M2+ events inside the radius, strongest first, and grade the area.
pub(crate) fn assess(collection: FeatureCollection, lat: f64, lng: f64, radius_km: f64) -> SeismicRisk {
    let mut events: Vec<EarthquakeEvent> = collection
        .features
        .into_iter()
        .filter_map(|f| to_event(f, lat, lng))
        .filter(|e| e.magnitude >= MIN_MAGNITUDE)
        .filter(|e| e.distance_km.is_some_and(|d| d <= radius_km))
        .collect();

    if events.is_empty() {
        return SeismicRisk::default();
    }

    events.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

    let event_count = events.len();
    let average = events.iter().map(|e| e.magnitude).sum::<f64>() / event_count as f64;
    events.truncate(MAX_RECENT_EVENTS);

    SeismicRisk {
        seismicity_level: SeismicityLevel::assess(event_count, average),
        event_count,
        average_magnitude: (average * 10.0).round() / 10.0,
        recent_events: events,
    }
}

fn to_event(feature: Feature, lat: f64, lng: f64) -> Option<EarthquakeEvent> {
    let magnitude = feature.properties.mag?;
    let (ev_lng, ev_lat) = match feature.geometry.coordinates.as_slice() {
        [lng, lat, ..] => (*lng, *lat),
        _ => return None,
    };
    let depth_km = feature.geometry.coordinates.get(2).copied().unwrap_or(0.0);
    let timestamp: DateTime<Utc> = feature
        .properties
        .time
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default();

    Some(EarthquakeEvent {
        id: feature.id,
        magnitude,
        depth_km,
        latitude: ev_lat,
        longitude: ev_lng,
        timestamp,
        location: feature.properties.place.unwrap_or_else(|| "Unknown".to_string()),
        distance_km: Some(haversine_km(lat, lng, ev_lat, ev_lng)),
        url: feature.properties.url.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str, mag: Option<f64>, lat: f64, lng: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "id": id,
            "properties": {
                "mag": mag,
                "place": format!("near {id}"),
                "time": 1_791_000_000_000i64,
                "url": format!("https://earthquake.usgs.gov/earthquakes/eventpage/{id}")
            },
            "geometry": { "type": "Point", "coordinates": [lng, lat, 10.0] }
        })
    }

    fn collection(features: Vec<serde_json::Value>) -> FeatureCollection {
        serde_json::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": features
        }))
        .unwrap()
    }

    #[test]
    fn empty_feed_is_low_risk() {
        let risk = assess(collection(vec![]), 18.0, -76.8, 150.0);
        assert_eq!(risk, SeismicRisk::default());
    }

    #[test]
    fn filters_by_radius_and_magnitude() {
        let risk = assess(
            collection(vec![
                feature("near_big", Some(4.6), 18.1, -76.7),
                feature("near_small", Some(1.4), 18.0, -76.8),
                feature("far", Some(6.1), 35.0, 139.0),
                feature("no_mag", None, 18.0, -76.8),
            ]),
            18.0,
            -76.8,
            150.0,
        );

        assert_eq!(risk.event_count, 1);
        assert_eq!(risk.recent_events[0].id, "near_big");
        assert_eq!(risk.seismicity_level, SeismicityLevel::Moderate);
        assert!(risk.recent_events[0].distance_km.unwrap() < 20.0);
    }

    #[test]
    fn keeps_five_strongest_and_averages_all() {
        let features = [2.1, 3.0, 2.5, 4.2, 2.8, 3.6, 2.2]
            .iter()
            .enumerate()
            .map(|(i, m)| feature(&format!("eq{i}"), Some(*m), 18.0 + i as f64 * 0.01, -76.8))
            .collect();

        let risk = assess(collection(features), 18.0, -76.8, 150.0);
        assert_eq!(risk.event_count, 7);
        assert_eq!(risk.recent_events.len(), 5);
        assert_eq!(risk.recent_events[0].magnitude, 4.2);
        assert_eq!(risk.recent_events[4].magnitude, 2.5);
        // (2.1+3.0+2.5+4.2+2.8+3.6+2.2)/7 = 2.914..
        assert_eq!(risk.average_magnitude, 2.9);
        assert_eq!(risk.seismicity_level, SeismicityLevel::High);
    }
}
