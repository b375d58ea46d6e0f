use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use vigil_common::{AirQuality, VigilError};

const WAQI_URL: &str = "https://api.waqi.info";

/// Raw AQI assumed when the station reports none.
const FALLBACK_RAW_AQI: f64 = 50.0;

/// World Air Quality Index geo feed. The `demo` token works for light use.
pub struct WaqiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

impl WaqiClient {
    pub fn new(client: reqwest::Client, token: &str) -> Self {
        Self {
            client,
            base_url: WAQI_URL.to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn feed(&self, lat: f64, lng: f64) -> Result<AirQuality> {
        let url = format!("{}/feed/geo:{lat};{lng}/", self.base_url);
        debug!(lat, lng, "WAQI feed request");

        let resp = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .context("WAQI request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VigilError::Provider {
                provider: "waqi",
                message: format!("HTTP {status}"),
            }
            .into());
        }

        let body: FeedResponse = resp.json().await.context("WAQI body was not JSON")?;
        parse_feed(body)
    }
}

/// Convert a 0–500 US AQI onto the 1–5 scale.
pub fn scale_aqi(raw: f64) -> u8 {
    let scaled = (raw / 500.0 * 5.0).ceil();
    scaled.clamp(1.0, 5.0) as u8
}

pub(crate) fn parse_feed(body: FeedResponse) -> Result<AirQuality> {
    if body.status != "ok" {
        // On error WAQI puts the message string in `data`.
        let message = body.data.as_str().unwrap_or("unknown error").to_string();
        return Err(VigilError::Provider {
            provider: "waqi",
            message,
        }
        .into());
    }

    let raw = number(&body.data["aqi"])
        .filter(|v| *v > 0.0)
        .unwrap_or(FALLBACK_RAW_AQI);

    let d = AirQuality::default();
    let iaqi = &body.data["iaqi"];
    let pollutant = |key: &str, fallback: f64| {
        number(&iaqi[key]["v"])
            .filter(|v| *v > 0.0)
            .unwrap_or(fallback)
    };

    Ok(AirQuality {
        aqi: scale_aqi(raw),
        pm25: pollutant("pm25", d.pm25),
        pm10: pollutant("pm10", d.pm10),
        no2: pollutant("no2", d.no2),
        o3: pollutant("o3", d.o3),
        so2: pollutant("so2", d.so2),
        co: pollutant("co", d.co),
    })
}

// Stations report "-" when a reading is unavailable.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
