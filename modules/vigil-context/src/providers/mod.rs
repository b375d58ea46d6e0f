pub mod open_meteo;
pub mod reliefweb;
pub mod usgs;
pub mod waqi;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use vigil_common::{AirQuality, Config, Disasters, SeismicRisk, Weather};

use crate::traits::EnvironmentSource;

pub use open_meteo::OpenMeteoClient;
pub use reliefweb::ReliefWebClient;
pub use usgs::UsgsClient;
pub use waqi::WaqiClient;

/// Upper bound on any single HTTP exchange; the aggregator's per-feed
/// budget is normally tighter.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// The public data services behind each feed, sharing one connection pool.
pub struct LiveSources {
    weather: OpenMeteoClient,
    air: WaqiClient,
    seismic: UsgsClient,
    disasters: ReliefWebClient,
}

impl LiveSources {
    pub fn new(waqi_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("vigil-context/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            weather: OpenMeteoClient::new(http.clone()),
            air: WaqiClient::new(http.clone(), waqi_token),
            seismic: UsgsClient::new(http.clone()),
            disasters: ReliefWebClient::new(http),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.waqi_token)
    }
}

#[async_trait]
impl EnvironmentSource for LiveSources {
    async fn current_weather(&self, lat: f64, lng: f64) -> Result<Weather> {
        self.weather.current(lat, lng).await
    }

    async fn air_quality(&self, lat: f64, lng: f64) -> Result<AirQuality> {
        self.air.feed(lat, lng).await
    }

    async fn seismic_risk(&self, lat: f64, lng: f64, radius_km: f64) -> Result<SeismicRisk> {
        self.seismic.seismic_risk(lat, lng, radius_km).await
    }

    async fn nearby_disasters(&self, country: &str) -> Result<Disasters> {
        self.disasters.nearby_disasters(country).await
    }
}
