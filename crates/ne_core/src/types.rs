use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SummaryPayload;
use crate::{Error, Result};

pub const AI_GENERATED_NOTICE: &str =
    "AI-generated summary. Source links provided for verification.";

/// Keys a summarizer must return for every event.
pub const REQUIRED_SUMMARY_KEYS: [&str; 6] = [
    "what_happened",
    "where_when",
    "why_it_matters",
    "what_next",
    "status",
    "bias_indicator",
];

/// A single item pulled from a feed. The link identifies the article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub source_name: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub country: String,
    pub city: String,
    pub category: String,
}

impl RawArticle {
    /// Text fed to the embedder.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    pub source_name: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

impl From<&RawArticle> for SourceLink {
    fn from(article: &RawArticle) -> Self {
        Self {
            source_name: article.source_name.clone(),
            url: article.link.clone(),
            published_at: article.published_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarySections {
    pub what_happened: String,
    pub where_when: String,
    pub why_it_matters: String,
    pub what_next: String,
}

/// Summarizer output that passed the required-keys check.
///
/// [`Summary::from_payload`] is the only constructor, so holding a `Summary`
/// means every required key was present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    sections: SummarySections,
    status: String,
    bias_indicator: String,
}

impl Summary {
    pub fn from_payload(payload: &SummaryPayload) -> Result<Self> {
        let mut missing: Vec<&str> = REQUIRED_SUMMARY_KEYS
            .iter()
            .copied()
            .filter(|key| !payload.contains_key(*key))
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(Error::Validation(format!(
                "summary payload missing fields: [{}]",
                missing.join(", ")
            )));
        }

        let field = |key: &str| payload.get(key).cloned().unwrap_or_default();
        Ok(Self {
            sections: SummarySections {
                what_happened: field("what_happened"),
                where_when: field("where_when"),
                why_it_matters: field("why_it_matters"),
                what_next: field("what_next"),
            },
            status: field("status"),
            bias_indicator: field("bias_indicator"),
        })
    }

    pub fn sections(&self) -> &SummarySections {
        &self.sections
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn bias_indicator(&self) -> &str {
        &self.bias_indicator
    }
}

/// An event with every derived field in place but no summary yet.
///
/// Summarizers receive this; [`EventDraft::finalize`] is the only way to turn
/// it into a public [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDraft {
    pub event_id: String,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub country: String,
    pub city: String,
    pub occurred_at: DateTime<Utc>,
    pub confidence: f64,
    pub source_diversity: usize,
    pub source_count: usize,
    pub embedding: Vec<f32>,
    pub source_links: Vec<SourceLink>,
    pub status: String,
    pub bias_indicator: String,
}

impl EventDraft {
    pub fn finalize(self, summary: Summary) -> Event {
        Event {
            event_id: self.event_id,
            slug: self.slug,
            title: self.title,
            category: self.category,
            country: self.country,
            city: self.city,
            occurred_at: self.occurred_at,
            confidence: self.confidence,
            source_diversity: self.source_diversity,
            source_count: self.source_count,
            embedding: self.embedding,
            source_links: self.source_links,
            summary: summary.sections,
            status: summary.status,
            bias_indicator: summary.bias_indicator,
            ai_generated_notice: AI_GENERATED_NOTICE.to_string(),
        }
    }
}

/// A deduplicated happening backed by one or more source articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub country: String,
    pub city: String,
    pub occurred_at: DateTime<Utc>,
    pub confidence: f64,
    pub source_diversity: usize,
    pub source_count: usize,
    pub embedding: Vec<f32>,
    pub source_links: Vec<SourceLink>,
    pub summary: SummarySections,
    pub status: String,
    pub bias_indicator: String,
    pub ai_generated_notice: String,
}
