use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ne_core::monitoring::AiCallRecord;
use ne_core::{EventDraft, MonitoringSink, Result, Summarizer, Summary, SummaryPayload};
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::info;

const PROMPT_TOKENS: u64 = 120;
const MIN_COMPLETION_TOKENS: u64 = 40;
const PROMPT_COST_PER_TOKEN: f64 = 0.000_000_2;
const COMPLETION_COST_PER_TOKEN: f64 = 0.000_000_6;

/// Validates summarizer output and remembers it per event id.
///
/// The first caller for an event id runs the summarizer; concurrent callers
/// for the same id wait for that result instead of issuing their own call.
/// A failed call leaves nothing cached, so a retried ingestion tries again.
pub struct SummaryService {
    model: Arc<dyn Summarizer>,
    monitoring: Arc<dyn MonitoringSink>,
    cache: Mutex<HashMap<String, Arc<OnceCell<Summary>>>>,
}

impl fmt::Debug for SummaryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryService")
            .field("model", &self.model.name())
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

impl SummaryService {
    pub fn new(model: Arc<dyn Summarizer>, monitoring: Arc<dyn MonitoringSink>) -> Self {
        Self {
            model,
            monitoring,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn summarize(&self, event: &EventDraft) -> Result<Summary> {
        let cell = self
            .cache
            .lock()
            .entry(event.event_id.clone())
            .or_default()
            .clone();

        let summary = cell
            .get_or_try_init(|| async {
                info!("🤖 Summarizing event {} with {}", event.event_id, self.model.name());
                let payload = self.model.summarize_event(event).await?;
                let summary = Summary::from_payload(&payload)?;
                self.record_usage(&payload);
                Ok::<_, ne_core::Error>(summary)
            })
            .await?;

        Ok(summary.clone())
    }

    fn record_usage(&self, payload: &SummaryPayload) {
        let (prompt_tokens, completion_tokens) = estimate_tokens(payload);
        self.monitoring.record_ai_call(AiCallRecord::new(
            self.model.provider(),
            self.model.name(),
            prompt_tokens,
            completion_tokens,
            estimate_cost_usd(prompt_tokens, completion_tokens),
        ));
    }
}

fn estimate_tokens(payload: &SummaryPayload) -> (u64, u64) {
    let words: usize = payload.values().map(|v| v.split_whitespace().count()).sum();
    (PROMPT_TOKENS, (words as u64).max(MIN_COMPLETION_TOKENS))
}

fn estimate_cost_usd(prompt_tokens: u64, completion_tokens: u64) -> f64 {
    let cost = prompt_tokens as f64 * PROMPT_COST_PER_TOKEN
        + completion_tokens as f64 * COMPLETION_COST_PER_TOKEN;
    (cost * 1_000_000.0).round() / 1_000_000.0
}
