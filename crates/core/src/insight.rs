use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::{
    error::InsightError,
    provider::Provider,
    types::{EventProperties, EventType, TrackedEvent},
};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful, analytical AI assistant for web developers.";
pub const TEMPERATURE: f32 = 0.3;

/// The slice of an event that is sent to the model.
#[derive(Debug, Serialize)]
pub struct EventDigest<'a> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: &'a str,
    pub path: &'a str,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<&'a EventProperties>,
}

/// Wall-clock time as `3:04:05 PM`.
pub fn format_event_time<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc.with_timezone(tz).format("%-I:%M:%S %p").to_string(),
        None => "Invalid Date".to_string(),
    }
}

pub fn digest_events<'a, I, Tz>(events: I, tz: &Tz) -> Vec<EventDigest<'a>>
where
    I: IntoIterator<Item = &'a TrackedEvent>,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    events
        .into_iter()
        .map(|event| EventDigest {
            event_type: event.event_type,
            name: &event.name,
            path: &event.path,
            time: format_event_time(event.timestamp, tz),
            props: event.properties.as_ref(),
        })
        .collect()
}

pub fn build_prompt(digests: &[EventDigest<'_>]) -> Result<String, InsightError> {
    let event_log = serde_json::to_string_pretty(digests)?;

    Ok(format!(
        r#"You are an expert Digital Analyst and UX Researcher.
Analyze the following log of user events from a simulated e-commerce website session.

Event Log (JSON):
{event_log}

Please provide a concise analysis covering:
1. **User Journey Summary**: Briefly describe the user's path.
2. **Engagement Analysis**: What captured the most attention? Are there signs of frustration (e.g., rage clicks, repetitive navigation)?
3. **Conversion Friction**: If they didn't convert (e.g., 'checkout_success'), why might that be based on the events? If they did, what was the key path?
4. **Actionable Recommendations**: 2-3 specific UX improvements.

Format the response in clean Markdown."#
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    pub temperature: f32,
}

/// A generative-text service that turns a prompt into free-form text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InsightError>;
}

/// Chat-completions backend speaking the OpenAI-compatible wire format.
pub struct HttpBackend {
    client: reqwest::Client,
    provider: Provider,
    api_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(provider: Provider, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
            api_url: provider.config().api_url.to_string(),
            api_key,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InsightError> {
        let api_key = self.provider.require_api_key(self.api_key.as_deref())?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": request.model,
                "messages": [
                    {
                        "role": "system",
                        "content": request.system_instruction,
                    },
                    {
                        "role": "user",
                        "content": request.prompt,
                    },
                ],
                "temperature": request.temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response = response.json::<serde_json::Value>().await?;
        let message = &response["choices"][0]["message"];
        if message.is_null() {
            return Err(InsightError::MalformedResponse {
                reason: format!("no message in response: {}", response),
            });
        }

        // A null or missing content field counts as an empty answer.
        Ok(message["content"].as_str().unwrap_or_default().to_string())
    }
}

pub struct InsightRequester<B> {
    backend: B,
    model: String,
}

impl InsightRequester<HttpBackend> {
    pub fn for_provider(provider: Provider, api_key: Option<String>) -> Self {
        Self::new(
            HttpBackend::new(provider, api_key),
            provider.config().model,
        )
    }
}

impl<B: CompletionBackend> InsightRequester<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send the events for analysis. Makes exactly one backend call unless
    /// `events` is empty, in which case none is made.
    pub async fn request<'a, I>(&self, events: I) -> Result<String, InsightError>
    where
        I: IntoIterator<Item = &'a TrackedEvent>,
    {
        let digests = digest_events(events, &Local);
        if digests.is_empty() {
            return Err(InsightError::EmptyInput);
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(&digests)?,
            temperature: TEMPERATURE,
        };

        tracing::info!(model = %self.model, events = digests.len(), "Requesting insight analysis");

        let text = self.backend.complete(&request).await?;
        if text.is_empty() {
            return Err(InsightError::EmptyResponse);
        }
        Ok(text)
    }

    /// Like [`request`](Self::request) but always yields display text.
    pub async fn request_text<'a, I>(&self, events: I) -> String
    where
        I: IntoIterator<Item = &'a TrackedEvent>,
    {
        match self.request(events).await {
            Ok(text) => text,
            Err(e) => {
                if !matches!(e, InsightError::EmptyInput) {
                    tracing::error!(error = %e, "Insight analysis failed");
                }
                e.display_text().to_string()
            }
        }
    }
}

/// Latest analysis shown to the user.
///
/// [`generate`](Self::generate) holds `&mut self` until the reply arrives,
/// so at most one request per panel is ever in flight.
#[derive(Debug, Default)]
pub struct InsightPanel {
    analysis: Option<String>,
}

impl InsightPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn can_generate(&self, event_count: usize) -> bool {
        event_count > 0
    }

    /// Run one analysis and replace whatever text was shown before.
    pub async fn generate<'a, B, I>(&mut self, requester: &InsightRequester<B>, events: I) -> &str
    where
        B: CompletionBackend,
        I: IntoIterator<Item = &'a TrackedEvent>,
    {
        let text = requester.request_text(events).await;
        self.analysis.insert(text)
    }
}
