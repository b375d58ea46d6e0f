use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use vigil_common::{AirQuality, Config, ExternalContext, Weather};

use crate::traits::EnvironmentSource;

/// Per-feed time budgets. A feed that overruns is treated like a feed that
/// failed: its neutral default is used.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub weather_timeout: Duration,
    pub air_quality_timeout: Duration,
    pub seismic_timeout: Duration,
    pub disaster_timeout: Duration,
    pub seismic_radius_km: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            weather_timeout: Duration::from_secs(5),
            air_quality_timeout: Duration::from_secs(5),
            seismic_timeout: Duration::from_secs(5),
            disaster_timeout: Duration::from_secs(5),
            seismic_radius_km: 150.0,
        }
    }
}

impl From<&Config> for AggregatorConfig {
    fn from(config: &Config) -> Self {
        Self {
            weather_timeout: config.provider_timeout,
            air_quality_timeout: config.provider_timeout,
            seismic_timeout: config.provider_timeout,
            disaster_timeout: config.provider_timeout,
            seismic_radius_km: config.seismic_radius_km,
        }
    }
}

/// Fans out to every environmental feed at once and folds the answers into a
/// fully populated [`ExternalContext`]. Never fails.
pub struct ContextAggregator {
    source: Arc<dyn EnvironmentSource>,
    config: AggregatorConfig,
}

impl ContextAggregator {
    pub fn new(source: Arc<dyn EnvironmentSource>, config: AggregatorConfig) -> Self {
        Self { source, config }
    }

    pub async fn fetch_context(&self, lat: f64, lng: f64, country: Option<&str>) -> ExternalContext {
        let source = self.source.as_ref();
        let config = &self.config;

        let (weather, air_quality, seismic_risk, disasters) = tokio::join!(
            bounded("weather", config.weather_timeout, source.current_weather(lat, lng)),
            bounded("air_quality", config.air_quality_timeout, source.air_quality(lat, lng)),
            bounded(
                "seismic",
                config.seismic_timeout,
                source.seismic_risk(lat, lng, config.seismic_radius_km),
            ),
            async {
                match country {
                    Some(country) => {
                        bounded("disasters", config.disaster_timeout, source.nearby_disasters(country))
                            .await
                    }
                    None => None,
                }
            },
        );

        info!(
            lat,
            lng,
            weather = weather.is_some(),
            air_quality = air_quality.is_some(),
            seismic = seismic_risk.is_some(),
            disasters = disasters.is_some(),
            "External context assembled"
        );

        ExternalContext {
            weather: weather.map(sanitize_weather).unwrap_or_default(),
            air_quality: air_quality.map(sanitize_air_quality).unwrap_or_default(),
            seismic_risk: seismic_risk.unwrap_or_default(),
            disasters: disasters.unwrap_or_default(),
        }
    }
}

/// Run one feed under its time budget; `None` on error or timeout.
async fn bounded<T, F>(feed: &'static str, limit: Duration, fut: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => {
            debug!(feed, "Feed answered");
            Some(value)
        }
        Ok(Err(e)) => {
            warn!(feed, error = %e, "Feed failed, using default");
            None
        }
        Err(_) => {
            warn!(feed, timeout_ms = limit.as_millis() as u64, "Feed timed out, using default");
            None
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn sanitize_weather(w: Weather) -> Weather {
    let d = Weather::default();
    Weather {
        temperature: finite_or(w.temperature, d.temperature),
        humidity: finite_or(w.humidity, d.humidity),
        precipitation: finite_or(w.precipitation, d.precipitation),
        wind_speed: finite_or(w.wind_speed, d.wind_speed),
        wind_gusts: w.wind_gusts.filter(|v| v.is_finite()),
        conditions: if w.conditions.trim().is_empty() {
            d.conditions
        } else {
            w.conditions
        },
        pressure: finite_or(w.pressure, d.pressure),
        cloud_cover: w.cloud_cover.filter(|v| v.is_finite()),
    }
}

fn sanitize_air_quality(a: AirQuality) -> AirQuality {
    let d = AirQuality::default();
    AirQuality {
        aqi: a.aqi.clamp(1, 5),
        pm25: finite_or(a.pm25, d.pm25),
        pm10: finite_or(a.pm10, d.pm10),
        no2: finite_or(a.no2, d.no2),
        o3: finite_or(a.o3, d.o3),
        so2: finite_or(a.so2, d.so2),
        co: finite_or(a.co, d.co),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Feed, StaticSource};
    use vigil_common::{SeismicRisk, SeismicityLevel};

    fn fast_config() -> AggregatorConfig {
        AggregatorConfig {
            weather_timeout: Duration::from_millis(50),
            air_quality_timeout: Duration::from_millis(50),
            seismic_timeout: Duration::from_millis(50),
            disaster_timeout: Duration::from_millis(50),
            seismic_radius_km: 150.0,
        }
    }

    fn live_context() -> ExternalContext {
        ExternalContext {
            weather: Weather {
                temperature: 31.0,
                humidity: 85.0,
                precipitation: 12.5,
                wind_speed: 20.0,
                wind_gusts: Some(45.0),
                conditions: "heavy rain".into(),
                pressure: 1002.0,
                cloud_cover: Some(100.0),
            },
            air_quality: AirQuality {
                aqi: 3,
                ..AirQuality::default()
            },
            seismic_risk: SeismicRisk {
                seismicity_level: SeismicityLevel::Moderate,
                event_count: 3,
                average_magnitude: 3.4,
                recent_events: vec![],
            },
            disasters: Default::default(),
        }
    }

    #[tokio::test]
    async fn healthy_feeds_pass_through() {
        let source = Arc::new(StaticSource::new(live_context()));
        let aggregator = ContextAggregator::new(source.clone(), fast_config());

        let ctx = aggregator.fetch_context(18.0, -76.8, Some("Jamaica")).await;
        assert_eq!(ctx, live_context());
        assert_eq!(source.calls(Feed::Disasters), 1);
    }

    #[tokio::test]
    async fn disasters_skipped_without_country() {
        let source = Arc::new(StaticSource::new(live_context()));
        let aggregator = ContextAggregator::new(source.clone(), fast_config());

        let ctx = aggregator.fetch_context(18.0, -76.8, None).await;
        assert_eq!(source.calls(Feed::Disasters), 0);
        assert!(ctx.disasters.nearby_events.is_empty());
        assert_eq!(source.calls(Feed::Weather), 1);
    }

    #[tokio::test]
    async fn failed_feed_falls_back_to_default_only_for_that_feed() {
        let source = Arc::new(StaticSource::new(live_context()).failing(Feed::Weather));
        let aggregator = ContextAggregator::new(source, fast_config());

        let ctx = aggregator.fetch_context(18.0, -76.8, None).await;
        assert_eq!(ctx.weather, Weather::default());
        assert_eq!(ctx.air_quality.aqi, 3);
        assert_eq!(ctx.seismic_risk.seismicity_level, SeismicityLevel::Moderate);
    }

    #[tokio::test]
    async fn stalled_feed_times_out_to_default() {
        let source = Arc::new(StaticSource::new(live_context()).stalled(Feed::Seismic));
        let aggregator = ContextAggregator::new(source, fast_config());

        let ctx = aggregator.fetch_context(18.0, -76.8, Some("Jamaica")).await;
        assert_eq!(ctx.seismic_risk, SeismicRisk::default());
        assert_eq!(ctx.weather.conditions, "heavy rain");
    }

    #[tokio::test]
    async fn every_feed_down_still_yields_complete_context() {
        let source = Arc::new(
            StaticSource::new(live_context())
                .failing(Feed::Weather)
                .failing(Feed::AirQuality)
                .stalled(Feed::Seismic)
                .failing(Feed::Disasters),
        );
        let aggregator = ContextAggregator::new(source, fast_config());

        let ctx = aggregator.fetch_context(18.0, -76.8, Some("Jamaica")).await;
        assert_eq!(ctx, ExternalContext::default());

        let json = serde_json::to_value(&ctx).unwrap();
        for key in ["weather", "airQuality", "seismicRisk", "disasters"] {
            assert!(json[key].is_object(), "{key} missing");
        }
        assert!((1..=5).contains(&ctx.air_quality.aqi));
    }

    #[tokio::test]
    async fn feeds_run_concurrently() {
        // Three stalled feeds at 50ms each should finish in ~50ms, not ~150ms.
        let source = Arc::new(
            StaticSource::new(live_context())
                .stalled(Feed::Weather)
                .stalled(Feed::AirQuality)
                .stalled(Feed::Seismic),
        );
        let aggregator = ContextAggregator::new(source, fast_config());

        let started = std::time::Instant::now();
        aggregator.fetch_context(18.0, -76.8, None).await;
        assert!(started.elapsed() < Duration::from_millis(140));
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let air = sanitize_air_quality(AirQuality {
            aqi: 0,
            pm25: f64::NAN,
            ..AirQuality::default()
        });
        assert_eq!(air.aqi, 1);
        assert_eq!(air.pm25, 15.0);

        let weather = sanitize_weather(Weather {
            temperature: f64::INFINITY,
            conditions: " ".into(),
            wind_gusts: Some(f64::NAN),
            ..Weather::default()
        });
        assert_eq!(weather.temperature, 20.0);
        assert_eq!(weather.conditions, "clear");
        assert!(weather.wind_gusts.is_none());
    }
}
