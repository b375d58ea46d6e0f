use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::{AiError, Result};

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1";

pub(crate) struct MistralClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl MistralClient {
    pub fn new(api_key: &str, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            http,
            base_url: MISTRAL_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST a chat completion and return the first choice's text content.
    pub async fn structured_output(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            schema = %request.response_format.json_schema.name,
            "Mistral structured output request"
        );

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let (content, finish_reason) = chat
            .first_content()
            .ok_or(AiError::EmptyResponse("Mistral"))?;

        if finish_reason.as_deref() == Some("length") {
            return Err(AiError::Parse(
                "Mistral response truncated at max_tokens".to_string(),
            ));
        }

        Ok(content)
    }
}
