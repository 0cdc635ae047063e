use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::types::EventDraft;
use crate::Result;

/// Raw key/value output of a summarizer, before validation.
pub type SummaryPayload = HashMap<String, String>;

pub trait Embedder: Send + Sync + fmt::Debug {
    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;

    /// Turn a piece of text into a vector. Must be deterministic.
    fn embed(&self, text: &str) -> Vec<f32>;
}

#[async_trait]
pub trait Summarizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Who serves the model, for cost accounting
    fn provider(&self) -> &str {
        "internal"
    }

    /// Produce the structured summary fields for an event
    async fn summarize_event(&self, event: &EventDraft) -> Result<SummaryPayload>;
}
