use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use vigil_common::{VigilError, Weather};

use crate::interpret::weather_code_conditions;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,weather_code,\
wind_speed_10m,wind_gusts_10m,pressure_msl,cloud_cover";

/// Open-Meteo current conditions. Keyless.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<u16>,
    wind_speed_10m: Option<f64>,
    wind_gusts_10m: Option<f64>,
    pressure_msl: Option<f64>,
    cloud_cover: Option<f64>,
}

impl OpenMeteoClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: OPEN_METEO_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn current(&self, lat: f64, lng: f64) -> Result<Weather> {
        let url = format!("{}/forecast", self.base_url);
        debug!(lat, lng, "Open-Meteo current weather request");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lng.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .context("Open-Meteo request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VigilError::Provider {
                provider: "open-meteo",
                message: format!("HTTP {status}"),
            }
            .into());
        }

        let body: ForecastResponse = resp.json().await.context("Open-Meteo body was not JSON")?;
        parse_current(body)
    }
}

/// Map the `current` block onto [`Weather`], defaulting absent readings.
pub(crate) fn parse_current(body: ForecastResponse) -> Result<Weather> {
    let current = body.current.ok_or_else(|| VigilError::Provider {
        provider: "open-meteo",
        message: "response has no `current` block".to_string(),
    })?;
    let d = Weather::default();

    Ok(Weather {
        temperature: current.temperature_2m.unwrap_or(d.temperature),
        humidity: current.relative_humidity_2m.unwrap_or(d.humidity),
        precipitation: current.precipitation.unwrap_or(0.0),
        wind_speed: current.wind_speed_10m.unwrap_or(d.wind_speed),
        wind_gusts: current.wind_gusts_10m,
        conditions: current
            .weather_code
            .map(weather_code_conditions)
            .unwrap_or("unknown")
            .to_string(),
        pressure: current.pressure_msl.unwrap_or(d.pressure),
        cloud_cover: current.cloud_cover,
    })
}
