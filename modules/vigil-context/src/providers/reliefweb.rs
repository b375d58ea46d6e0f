use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use vigil_common::{DisasterEvent, Disasters, VigilError};

const RELIEFWEB_URL: &str = "https://api.reliefweb.int/v1";
const APP_NAME: &str = "vigil";
const PAGE_LIMIT: usize = 15;

/// ReliefWeb disaster listings for a country, newest first.
pub struct ReliefWebClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DisastersResponse {
    #[serde(default)]
    data: Vec<DisasterItem>,
}

#[derive(Debug, Deserialize)]
struct DisasterItem {
    id: serde_json::Value,
    #[serde(default)]
    fields: DisasterFields,
}

#[derive(Debug, Default, Deserialize)]
struct DisasterFields {
    name: Option<String>,
    status: Option<String>,
    date: Option<DateField>,
    #[serde(default)]
    country: Vec<Named>,
    #[serde(default, rename = "type")]
    kind: Vec<Named>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateField {
    created: Option<String>,
    event: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl ReliefWebClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: RELIEFWEB_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn nearby_disasters(&self, country: &str) -> Result<Disasters> {
        let url = format!("{}/disasters", self.base_url);
        debug!(country, "ReliefWeb disasters request");

        let body = serde_json::json!({
            "filter": { "field": "country", "value": country },
            "fields": { "include": ["name", "status", "date", "country", "type", "url"] },
            "sort": ["date:desc"],
            "limit": PAGE_LIMIT,
        });

        let resp = self
            .client
            .post(&url)
            .query(&[("appname", APP_NAME)])
            .json(&body)
            .send()
            .await
            .context("ReliefWeb request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VigilError::Provider {
                provider: "reliefweb",
                message: format!("HTTP {status}"),
            }
            .into());
        }

        let parsed: DisastersResponse = resp.json().await.context("ReliefWeb body was not JSON")?;
        Ok(parse_disasters(parsed, country))
    }
}

pub(crate) fn parse_disasters(resp: DisastersResponse, country: &str) -> Disasters {
    let events = resp
        .data
        .into_iter()
        .map(|item| {
            let f = item.fields;
            let id = match item.id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            let countries: Vec<String> = f.country.into_iter().map(|c| c.name).collect();
            DisasterEvent {
                id,
                title: f.name.unwrap_or_else(|| "Unnamed event".to_string()),
                event_type: f
                    .kind
                    .into_iter()
                    .next()
                    .map(|t| t.name)
                    .unwrap_or_else(|| "Other".to_string()),
                status: f.status.unwrap_or_else(|| "unknown".to_string()),
                date: f
                    .date
                    .and_then(|d| d.event.or(d.created))
                    .unwrap_or_default(),
                location: countries.join(", "),
                country: countries
                    .first()
                    .cloned()
                    .unwrap_or_else(|| country.to_string()),
                url: f.url.unwrap_or_default(),
                source: "ReliefWeb".to_string(),
            }
        })
        .collect();

    Disasters::from_events(events)
}
