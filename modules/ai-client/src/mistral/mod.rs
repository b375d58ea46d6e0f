mod client;
pub(crate) mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AiError, Result};
use crate::traits::{StructuredGenerator, StructuredRequest};
use crate::util::strip_code_blocks;

use client::MistralClient;
use types::*;

pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-small-2503";

// =============================================================================
// Mistral
// =============================================================================

/// Mistral backend using chat completions with a `json_schema` response format.
#[derive(Clone)]
pub struct Mistral {
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Mistral {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 4096,
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> MistralClient {
        let client = MistralClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    fn build_request(&self, request: &StructuredRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage::system(request.system.clone()),
                WireMessage::user(request.user.clone()),
            ],
            temperature: request.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: request.schema_name.clone(),
                    strict: true,
                    schema: request.schema.clone(),
                },
            },
        }
    }
}

#[async_trait]
impl StructuredGenerator for Mistral {
    fn provider(&self) -> &'static str {
        "mistral"
    }

    async fn generate(&self, request: &StructuredRequest) -> Result<Value> {
        let wire = self.build_request(request);
        let content = self.client().structured_output(&wire).await?;
        serde_json::from_str(strip_code_blocks(&content))
            .map_err(|e| AiError::Parse(format!("Mistral returned non-JSON content: {e}")))
    }
}
