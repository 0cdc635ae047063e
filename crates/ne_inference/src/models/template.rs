use std::fmt;

use ne_core::{EventDraft, Result, Summarizer, SummaryPayload};

/// Offline summarizer that fills the summary from the event's own fields.
pub struct TemplateSummarizer {
    model_name: String,
}

impl fmt::Debug for TemplateSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSummarizer")
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl Default for TemplateSummarizer {
    fn default() -> Self {
        Self {
            model_name: "template-v1".to_string(),
        }
    }
}

impl TemplateSummarizer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Summarizer for TemplateSummarizer {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn provider(&self) -> &str {
        "internal-template"
    }

    async fn summarize_event(&self, event: &EventDraft) -> Result<SummaryPayload> {
        let status = if event.confidence >= 0.65 { "Confirmed" } else { "Developing" };
        let bias = if event.source_diversity < 2 { "medium" } else { "low" };

        let fields = [
            (
                "what_happened",
                format!(
                    "{} sources report related developments in {}.",
                    event.source_count, event.category
                ),
            ),
            (
                "where_when",
                format!(
                    "Reported around {}, {} at {}.",
                    event.city,
                    event.country,
                    event.occurred_at.to_rfc3339()
                ),
            ),
            (
                "why_it_matters",
                "This may influence policy, business decisions, and local planning.".to_string(),
            ),
            (
                "what_next",
                "Expect updates as additional sources confirm details.".to_string(),
            ),
            ("status", status.to_string()),
            ("bias_indicator", bias.to_string()),
        ];

        Ok(fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect())
    }
}
