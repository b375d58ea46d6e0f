mod client;
pub(crate) mod types;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{AiError, Result};
use crate::traits::{StructuredGenerator, StructuredRequest};

use client::ClaudeClient;
use types::*;

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-haiku-4-5-20251001";
const STRUCTURED_TOOL: &str = "structured_response";

// =============================================================================
// Claude
// =============================================================================

/// Claude backend. Structured output is obtained by forcing a single tool
/// call whose input schema is the requested schema.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    fn build_request(&self, request: &StructuredRequest) -> ChatRequest {
        ChatRequest::new(&self.model)
            .system(request.system.clone())
            .message(WireMessage::user(request.user.clone()))
            .temperature(request.temperature)
            .forced_tool(ToolDefinitionWire {
                name: STRUCTURED_TOOL.to_string(),
                description: format!("Return a {} object.", request.schema_name),
                input_schema: request.schema.clone(),
            })
    }
}

#[async_trait]
impl StructuredGenerator for Claude {
    fn provider(&self) -> &'static str {
        "claude"
    }

    async fn generate(&self, request: &StructuredRequest) -> Result<Value> {
        let wire = self.build_request(request);
        let response = self.client().chat(&wire).await?;

        debug!(
            model = %self.model,
            stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
            "Claude structured response received"
        );

        match response.tool_input(STRUCTURED_TOOL) {
            Some(input) => Ok(input.clone()),
            None => {
                debug!(
                    text = response.text().unwrap_or_default(),
                    "Claude answered without calling the structured tool"
                );
                Err(AiError::EmptyResponse("Claude"))
            }
        }
    }
}
