use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ne_core::{Error, EventDraft, Result, Summarizer, SummaryPayload, REQUIRED_SUMMARY_KEYS};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Summarizer backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatSummarizer {
    client: Arc<Client>,
    api_key: String,
    base_url: Url,
    model: String,
    timeout: Duration,
}

impl ChatSummarizer {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<&str>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("chat summarizer requires an API key".to_string()))?;
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))
            .map_err(|e| Error::Config(format!("invalid summarizer base URL: {}", e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            timeout,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Inference(format!(
                "summarizer request to {} timed out after {:?}",
                self.endpoint(),
                self.timeout
            ))
        } else {
            Error::Http(e)
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.as_str().trim_end_matches('/'))
    }

    fn prompt(event: &EventDraft) -> String {
        let sources = event
            .source_links
            .iter()
            .map(|link| format!("- {} ({}) {}", link.source_name, link.published_at.to_rfc3339(), link.url))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Summarize this news event neutrally. Reply with a single JSON object with the string keys {}.\n\
             \"status\" must be \"Confirmed\" or \"Developing\"; \"bias_indicator\" must be \"low\", \"medium\" or \"high\".\n\n\
             Category: {}\nLocation: {}, {}\nLatest report: {}\nConfidence: {:.3}\nDistinct sources: {}\n\nSources:\n{}",
            REQUIRED_SUMMARY_KEYS.join(", "),
            event.category,
            event.city,
            event.country,
            event.occurred_at.to_rfc3339(),
            event.confidence,
            event.source_diversity,
            sources
        )
    }
}

impl fmt::Debug for ChatSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSummarizer")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parse the model's reply into a flat string map.
///
/// Replies wrapped in a markdown code fence are accepted. Non-string values
/// are kept in their JSON form.
pub(crate) fn parse_reply(content: &str) -> Result<SummaryPayload> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let object: serde_json::Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| Error::Inference(format!("summarizer reply is not a JSON object: {}", e)))?;

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    fn name(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "openai-compatible"
    }

    async fn summarize_event(&self, event: &EventDraft) -> Result<SummaryPayload> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You write short, neutral news event summaries as JSON.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::prompt(event),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.request_error(e))?
            .json::<ChatResponse>()
            .await
            .map_err(|e| self.request_error(e))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Inference("summarizer returned no choices".to_string()))?;

        parse_reply(&content)
    }
}
