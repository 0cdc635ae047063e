//! Counters and logs for ingestion and summarization.
//!
//! The store is passed around as `Arc<dyn MonitoringSink>` so every component
//! (and every test) gets its own instance. Recording never fails and never
//! waits on anything but a short in-process lock.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

const MAX_AI_CALLS: usize = 1000;
const MAX_ALERTS: usize = 200;
const MIN_RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiCallRecord {
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost_usd: f64,
    pub timestamp: DateTime<Utc>,
}

impl AiCallRecord {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        prompt_tokens: u64,
        completion_tokens: u64,
        estimated_cost_usd: f64,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            prompt_tokens,
            completion_tokens,
            estimated_cost_usd,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringSnapshot {
    pub ai_calls: usize,
    pub total_tokens: u64,
    pub total_estimated_cost_usd: f64,
    pub ingestion_failures: u64,
    pub publishing_failures: u64,
    pub alerts: Vec<String>,
    pub event_counters: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
}

pub trait MonitoringSink: Send + Sync {
    fn record_ai_call(&self, call: AiCallRecord);

    fn record_ingestion_failure(&self, reason: &str);

    fn record_publishing_failure(&self, reason: &str);

    fn snapshot(&self) -> MonitoringSnapshot;
}

#[derive(Debug, Default)]
struct Inner {
    ai_calls: VecDeque<AiCallRecord>,
    ingestion_failures: u64,
    publishing_failures: u64,
    alerts: VecDeque<String>,
    event_counters: BTreeMap<String, u64>,
}

impl Inner {
    fn bump(&mut self, counter: &str) {
        *self.event_counters.entry(counter.to_string()).or_insert(0) += 1;
    }

    fn push_alert(&mut self, message: String) {
        if self.alerts.len() == MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(message);
        self.bump("alerts");
    }
}

#[derive(Debug)]
pub struct MonitoringStore {
    inner: Mutex<Inner>,
    cost_spike_multiplier: f64,
    recent_window: usize,
}

impl Default for MonitoringStore {
    fn default() -> Self {
        Self::new(2.0, 50)
    }
}

impl MonitoringStore {
    pub fn new(cost_spike_multiplier: f64, recent_window: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            cost_spike_multiplier,
            recent_window: recent_window.max(MIN_RECENT_WINDOW),
        }
    }

    pub fn from_settings(settings: &crate::Settings) -> Self {
        Self::new(settings.cost_spike_multiplier, settings.cost_window)
    }

    /// Compare the newest call against the mean of the ones before it.
    fn check_cost_spike(&self, inner: &mut Inner) -> Option<String> {
        let len = inner.ai_calls.len();
        let take = len.min(self.recent_window);
        if take < MIN_RECENT_WINDOW {
            return None;
        }

        let message = {
            let recent: Vec<&AiCallRecord> = inner.ai_calls.iter().skip(len - take).collect();
            let (latest, previous) = recent.split_last()?;
            let baseline = previous.iter().map(|r| r.estimated_cost_usd).sum::<f64>()
                / previous.len().max(1) as f64;
            if baseline <= 0.0 || latest.estimated_cost_usd < baseline * self.cost_spike_multiplier {
                return None;
            }
            format!(
                "Cost spike detected: latest={:.6} baseline={:.6} model={}",
                latest.estimated_cost_usd, baseline, latest.model
            )
        };

        inner.push_alert(message.clone());
        Some(message)
    }
}

impl MonitoringSink for MonitoringStore {
    fn record_ai_call(&self, call: AiCallRecord) {
        info!(
            "🤖 AI call provider={} model={} prompt_tokens={} completion_tokens={} estimated_cost_usd={:.6}",
            call.provider, call.model, call.prompt_tokens, call.completion_tokens, call.estimated_cost_usd
        );

        let spike = {
            let mut inner = self.inner.lock();
            if inner.ai_calls.len() == MAX_AI_CALLS {
                inner.ai_calls.pop_front();
            }
            inner.ai_calls.push_back(call);
            inner.bump("ai_calls");
            self.check_cost_spike(&mut inner)
        };

        if let Some(message) = spike {
            warn!("💸 {}", message);
        }
    }

    fn record_ingestion_failure(&self, reason: &str) {
        {
            let mut inner = self.inner.lock();
            inner.ingestion_failures += 1;
            inner.bump("ingestion_failures");
        }
        error!("Ingestion failure: {}", reason);
    }

    fn record_publishing_failure(&self, reason: &str) {
        {
            let mut inner = self.inner.lock();
            inner.publishing_failures += 1;
            inner.bump("publishing_failures");
        }
        error!("Publishing failure: {}", reason);
    }

    fn snapshot(&self) -> MonitoringSnapshot {
        let inner = self.inner.lock();
        let total_tokens = inner
            .ai_calls
            .iter()
            .map(|r| r.prompt_tokens + r.completion_tokens)
            .sum();
        let total_cost: f64 = inner.ai_calls.iter().map(|r| r.estimated_cost_usd).sum();

        MonitoringSnapshot {
            ai_calls: inner.ai_calls.len(),
            total_tokens,
            total_estimated_cost_usd: (total_cost * 1_000_000.0).round() / 1_000_000.0,
            ingestion_failures: inner.ingestion_failures,
            publishing_failures: inner.publishing_failures,
            alerts: inner.alerts.iter().cloned().collect(),
            event_counters: inner.event_counters.clone(),
            last_updated: Utc::now(),
        }
    }
}
