// EnvironmentSource is the one boundary between the aggregator and the outside
// world. LiveSources talks HTTP; StaticSource (testing.rs) answers from memory
// and can be told to fail or stall per feed.

use anyhow::Result;
use async_trait::async_trait;

use vigil_common::{AirQuality, Disasters, SeismicRisk, Weather};

#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    /// Current conditions at a point.
    async fn current_weather(&self, lat: f64, lng: f64) -> Result<Weather>;

    /// Air quality on the 1–5 scale plus pollutant readings.
    async fn air_quality(&self, lat: f64, lng: f64) -> Result<AirQuality>;

    /// Recent seismic activity within `radius_km` of the point.
    async fn seismic_risk(&self, lat: f64, lng: f64, radius_km: f64) -> Result<SeismicRisk>;

    /// Officially declared disasters for a country.
    async fn nearby_disasters(&self, country: &str) -> Result<Disasters>;
}
