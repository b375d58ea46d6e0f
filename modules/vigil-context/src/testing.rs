// In-memory EnvironmentSource for tests.
//
// StaticSource answers every feed from a fixed ExternalContext. Individual
// feeds can be switched to fail (immediate error) or stall (never resolve,
// so only the aggregator's timeout ends them). Calls are counted per feed.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use vigil_common::{AirQuality, Disasters, ExternalContext, SeismicRisk, Weather};

use crate::traits::EnvironmentSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Weather,
    AirQuality,
    Seismic,
    Disasters,
}

pub struct StaticSource {
    context: ExternalContext,
    failing: HashSet<Feed>,
    stalled: HashSet<Feed>,
    calls: Mutex<HashMap<Feed, usize>>,
}

impl StaticSource {
    pub fn new(context: ExternalContext) -> Self {
        Self {
            context,
            failing: HashSet::new(),
            stalled: HashSet::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing(mut self, feed: Feed) -> Self {
        self.failing.insert(feed);
        self
    }

    pub fn stalled(mut self, feed: Feed) -> Self {
        self.stalled.insert(feed);
        self
    }

    pub fn calls(&self, feed: Feed) -> usize {
        self.calls.lock().unwrap().get(&feed).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn answer<T>(&self, feed: Feed, value: T) -> Result<T> {
        *self.calls.lock().unwrap().entry(feed).or_insert(0) += 1;
        if self.stalled.contains(&feed) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&feed) {
            bail!("{feed:?} feed unavailable");
        }
        Ok(value)
    }
}

#[async_trait]
impl EnvironmentSource for StaticSource {
    async fn current_weather(&self, _lat: f64, _lng: f64) -> Result<Weather> {
        self.answer(Feed::Weather, self.context.weather.clone()).await
    }

    async fn air_quality(&self, _lat: f64, _lng: f64) -> Result<AirQuality> {
        self.answer(Feed::AirQuality, self.context.air_quality.clone()).await
    }

    async fn seismic_risk(&self, _lat: f64, _lng: f64, _radius_km: f64) -> Result<SeismicRisk> {
        self.answer(Feed::Seismic, self.context.seismic_risk.clone()).await
    }

    async fn nearby_disasters(&self, _country: &str) -> Result<Disasters> {
        self.answer(Feed::Disasters, self.context.disasters.clone()).await
    }
}
