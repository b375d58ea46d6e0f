// Test doubles for the prediction pipeline.
//
// ScriptedGenerator (StructuredGenerator) answers from a script: either a
// FIFO of steps, or rules keyed on a substring of the user prompt. Calls
// and the last request are recorded.
//
// StaticSource (EnvironmentSource) lives in vigil-context and is re-exported.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use ai_client::{AiError, StructuredGenerator, StructuredRequest};
use vigil_common::Report;

pub use vigil_context::testing::{Feed, StaticSource};

#[derive(Debug, Clone)]
enum Step {
    Respond(Value),
    Fail(String),
    Stall,
}

/// Scripted stand-in for a hosted model.
///
/// Rules added with `.respond_when()` / `.fail_when()` win when their needle
/// occurs in the user prompt. Otherwise steps are consumed in order and the
/// final step repeats once the script runs out. With no script at all every
/// call fails.
pub struct ScriptedGenerator {
    rules: Vec<(String, Step)>,
    steps: Mutex<VecDeque<Step>>,
    last_step: Mutex<Option<Step>>,
    calls: Mutex<Vec<StructuredRequest>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            steps: Mutex::new(VecDeque::new()),
            last_step: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, value: Value) -> Self {
        self.push(Step::Respond(value))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Step::Fail(message.to_string()))
    }

    /// Never answer; only a caller-side timeout ends the call.
    pub fn stall(self) -> Self {
        self.push(Step::Stall)
    }

    pub fn respond_when(mut self, needle: &str, value: Value) -> Self {
        self.rules.push((needle.to_string(), Step::Respond(value)));
        self
    }

    pub fn fail_when(mut self, needle: &str, message: &str) -> Self {
        self.rules
            .push((needle.to_string(), Step::Fail(message.to_string())));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<StructuredRequest> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    fn next_step(&self, request: &StructuredRequest) -> Option<Step> {
        if let Some((_, step)) = self
            .rules
            .iter()
            .find(|(needle, _)| request.user.contains(needle.as_str()))
        {
            return Some(step.clone());
        }

        let mut last = self.last_step.lock().unwrap();
        match self.steps.lock().unwrap().pop_front() {
            Some(step) => {
                *last = Some(step.clone());
                Some(step)
            }
            None => last.clone(),
        }
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedGenerator {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &StructuredRequest) -> ai_client::Result<Value> {
        self.calls.lock().unwrap().push(request.clone());

        match self.next_step(request) {
            Some(Step::Respond(value)) => Ok(value),
            Some(Step::Fail(message)) => Err(AiError::Api {
                status: 503,
                message,
            }),
            Some(Step::Stall) => {
                std::future::pending::<()>().await;
                Err(AiError::EmptyResponse("stalled"))
            }
            None => Err(AiError::EmptyResponse("no scripted response")),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Kingston, Jamaica.
pub const KINGSTON: (f64, f64) = (18.0, -76.8);

pub fn test_report(id: &str, lat: f64, lng: f64) -> Report {
    Report {
        id: id.to_string(),
        latitude: lat,
        longitude: lng,
        category: "flood".to_string(),
        tags: vec!["drainage".to_string()],
        severity_level: 3,
        timestamp: Utc::now(),
        description: format!("Water pooling near {id}"),
        ai_summary: None,
        credibility_score: 0.7,
        status: "active".to_string(),
    }
}

/// A valid flood candidate with zero offsets.
pub fn flood_candidate(confidence: u32) -> Value {
    json!({
        "type": "flood",
        "description": "Street flooding expected near the reported drains",
        "confidence": confidence,
        "radius_meters": 1000,
        "expires_hours": 6,
        "reasoning": "Multiple drainage reports during sustained rainfall",
        "weather_influence": "Rainfall and high humidity",
        "urgency_level": "high",
        "external_data_used": "weather.precipitation",
        "lat_offset": 0,
        "lng_offset": 0
    })
}
