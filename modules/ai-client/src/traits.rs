use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AiError, Result};
use crate::schema::StructuredOutput;

// =============================================================================
// Request
// =============================================================================

/// One schema-constrained generation: a system instruction, a user prompt and
/// the JSON schema the answer must satisfy.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
    pub temperature: f32,
}

impl StructuredRequest {
    pub fn for_type<T: StructuredOutput>(
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            schema_name: T::wire_name(),
            schema: T::strict_schema(),
            temperature: 0.0,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

// =============================================================================
// StructuredGenerator Trait
// =============================================================================

/// A hosted model that answers with JSON conforming to a supplied schema.
///
/// Implementations return the raw JSON value; typing and bound checks happen
/// on the caller's side so a mock can hand back arbitrary payloads.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Provider label for logs.
    fn provider(&self) -> &'static str;

    async fn generate(&self, request: &StructuredRequest) -> Result<Value>;
}

/// Build a request for `T`, send it, and deserialize the answer.
///
/// A payload that does not deserialize into `T` is an [`AiError::Schema`].
pub async fn generate_typed<T: StructuredOutput>(
    generator: &dyn StructuredGenerator,
    system: &str,
    user: &str,
    temperature: f32,
) -> Result<T> {
    let request = StructuredRequest::for_type::<T>(system, user).temperature(temperature);
    let value = generator.generate(&request).await?;
    serde_json::from_value(value).map_err(|e| AiError::Schema(e.to_string()))
}
