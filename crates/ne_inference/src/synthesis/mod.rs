//! Reduces a finished cluster to exactly one [`Event`].
//!
//! Derivation happens in two steps: every field computable from the cluster
//! goes into an [`EventDraft`], then the summarizer result is attached once
//! and the draft is frozen into an [`Event`].

use std::sync::Arc;

use chrono::Duration;
use ne_core::{Event, EventDraft, RawArticle, Result, SourceLink};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::clustering::Cluster;
use crate::summary::SummaryService;

const CONFIRMED_THRESHOLD: f64 = 0.65;
const SLUG_MAX_CHARS: usize = 60;

#[derive(Debug)]
pub struct EventSynthesizer {
    summaries: Arc<SummaryService>,
}

impl EventSynthesizer {
    pub fn new(summaries: Arc<SummaryService>) -> Self {
        Self { summaries }
    }

    pub async fn synthesize(&self, cluster: &Cluster) -> Result<Event> {
        let draft = draft(cluster);
        let summary = self.summaries.summarize(&draft).await?;
        info!("✨ Event {} ready ({} sources)", draft.slug, draft.source_count);
        Ok(draft.finalize(summary))
    }
}

pub(crate) fn draft(cluster: &Cluster) -> EventDraft {
    let members = cluster.members();
    let primary = primary_article(members);

    let source_count = members.len();
    let source_diversity = source_diversity(members);
    let confidence = confidence_score(source_count, source_diversity, time_consistency(members));
    let title = event_title(&primary.category, &primary.city, &primary.country, source_count);

    EventDraft {
        event_id: event_id(members.iter().map(|a| a.link.as_str())),
        slug: make_slug(&title),
        title,
        category: primary.category.clone(),
        country: primary.country.clone(),
        city: primary.city.clone(),
        occurred_at: primary.published_at,
        confidence,
        source_diversity,
        source_count,
        embedding: cluster.centroid().to_vec(),
        source_links: members.iter().map(SourceLink::from).collect(),
        status: initial_status(confidence).to_string(),
        bias_indicator: "unknown".to_string(),
    }
}

/// Latest published member; on equal timestamps the first appended wins.
fn primary_article(members: &[RawArticle]) -> &RawArticle {
    let mut primary = &members[0];
    for article in &members[1..] {
        if article.published_at > primary.published_at {
            primary = article;
        }
    }
    primary
}

fn source_diversity(members: &[RawArticle]) -> usize {
    let mut names: Vec<&str> = members.iter().map(|a| a.source_name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    names.len()
}

/// 1.0 when all members fall within 24 hours of each other, else 0.5.
fn time_consistency(members: &[RawArticle]) -> f64 {
    if members.len() <= 1 {
        return 1.0;
    }
    let earliest = members.iter().map(|a| a.published_at).min();
    let latest = members.iter().map(|a| a.published_at).max();
    match (earliest, latest) {
        (Some(earliest), Some(latest)) if latest - earliest <= Duration::hours(24) => 1.0,
        _ => 0.5,
    }
}

pub fn confidence_score(source_count: usize, source_diversity: usize, time_consistency: f64) -> f64 {
    let raw = 0.35
        + 0.2 * source_count as f64
        + 0.2 * source_diversity as f64
        + 0.25 * time_consistency;
    ((raw * 1000.0).round() / 1000.0).min(1.0)
}

fn initial_status(confidence: f64) -> &'static str {
    if confidence >= CONFIRMED_THRESHOLD {
        "Confirmed"
    } else {
        "Developing"
    }
}

/// First 16 hex chars of SHA-256 over the sorted, `|`-joined member links.
pub fn event_id<'a, I>(links: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut links: Vec<&str> = links.into_iter().collect();
    links.sort_unstable();
    let digest = Sha256::digest(links.join("|").as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(16);
    hex
}

pub fn event_title(category: &str, city: &str, country: &str, source_count: usize) -> String {
    format!(
        "{} event update from {}, {} ({} sources)",
        title_case(category),
        city,
        country,
        source_count
    )
}

pub fn make_slug(title: &str) -> String {
    let joined = title.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
    let truncated: String = joined.chars().take(SLUG_MAX_CHARS).collect();
    let mut suffix = format!("{:x}", Sha256::digest(title.as_bytes()));
    suffix.truncate(8);
    format!("{}-{}", truncated.trim_end_matches('-'), suffix)
}

/// Uppercase the first letter of every word and lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{Clusterer, DEFAULT_SIMILARITY_THRESHOLD};
    use crate::embeddings::DeterministicEmbedder;
    use crate::models::TemplateSummarizer;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use ne_core::{Error, MonitoringStore, Summarizer, SummaryPayload};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    fn article(source: &str, link: &str, title: &str, description: &str, published_at: DateTime<Utc>) -> RawArticle {
        RawArticle {
            source_name: source.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            published_at,
            country: "US".to_string(),
            city: "Austin".to_string(),
            category: "tech".to_string(),
        }
    }

    fn chip(source: &str, link: &str, published_at: DateTime<Utc>) -> RawArticle {
        article(source, link, "AI chip launch", "new ai chip announced", published_at)
    }

    fn cluster_of(articles: Vec<RawArticle>) -> Cluster {
        // A threshold of -1 accepts every score, so everything lands in one cluster.
        let clusterer = Clusterer::new(Arc::new(DeterministicEmbedder::default()), -1.0);
        let mut clusters = clusterer.cluster(articles);
        assert_eq!(clusters.len(), 1);
        clusters.remove(0)
    }

    fn synthesizer(model: Arc<dyn Summarizer>) -> EventSynthesizer {
        let summaries = SummaryService::new(model, Arc::new(MonitoringStore::default()));
        EventSynthesizer::new(Arc::new(summaries))
    }

    #[derive(Debug)]
    struct MissingBias;

    #[async_trait]
    impl Summarizer for MissingBias {
        fn name(&self) -> &str {
            "missing-bias"
        }

        async fn summarize_event(&self, _event: &EventDraft) -> Result<SummaryPayload> {
            Ok(["what_happened", "where_when", "why_it_matters", "what_next", "status"]
                .iter()
                .map(|k| (k.to_string(), "text".to_string()))
                .collect())
        }
    }

    #[test]
    fn test_confidence_formula() {
        assert_eq!(confidence_score(2, 2, 1.0), 1.0);
        assert_eq!(confidence_score(1, 1, 0.5), 0.875);
        assert_eq!(confidence_score(40, 3, 0.5), 1.0);
    }

    #[test]
    fn test_time_consistency() {
        let close = vec![chip("A", "https://a.com/1", at(1, 0)), chip("B", "https://b.com/1", at(2, 0))];
        let far = vec![chip("A", "https://a.com/1", at(1, 0)), chip("B", "https://b.com/1", at(2, 1))];
        assert_eq!(time_consistency(&close), 1.0);
        assert_eq!(time_consistency(&far), 0.5);
        assert_eq!(time_consistency(&far[..1]), 1.0);
    }

    #[test]
    fn test_event_id_ignores_order_but_not_membership() {
        let forward = event_id(["https://a.com/1", "https://b.com/1"]);
        let backward = event_id(["https://b.com/1", "https://a.com/1"]);
        assert_eq!(forward, backward);
        assert_eq!(forward, "1c0a89caec6fd3e9");
        assert_ne!(forward, event_id(["https://a.com/1", "https://b.com/1", "https://c.com/1"]));
        assert_ne!(forward, event_id(["https://a.com/1"]));
    }

    #[test]
    fn test_title_and_slug() {
        let title = event_title("tech", "Austin", "US", 2);
        assert_eq!(title, "Tech event update from Austin, US (2 sources)");
        assert_eq!(make_slug(&title), "tech-event-update-from-austin,-us-(2-sources)-90acdd2b");
    }

    #[test]
    fn test_slug_truncates_and_strips_trailing_hyphen() {
        let title = event_title("world news", "San Francisco Bay Area", "United States of America", 12);
        assert!(title.starts_with("World News event update"));
        assert_eq!(
            make_slug(&title),
            "world-news-event-update-from-san-francisco-bay-area,-united-1169dcb6"
        );
    }

    #[test]
    fn test_primary_is_latest_with_first_wins_on_ties() {
        let mut early = chip("A", "https://a.com/1", at(1, 0));
        early.city = "Dallas".to_string();
        let mut late_first = chip("B", "https://b.com/1", at(1, 5));
        late_first.city = "Austin".to_string();
        let mut late_second = chip("C", "https://c.com/1", at(1, 5));
        late_second.city = "Houston".to_string();

        let members = vec![early, late_first, late_second];
        assert_eq!(primary_article(&members).link, "https://b.com/1");
    }

    #[test]
    fn test_draft_fields() {
        let cluster = cluster_of(vec![
            chip("A", "https://a.com/1", at(1, 0)),
            chip("B", "https://b.com/1", at(1, 1)),
            chip("A", "https://a.com/2", at(1, 0)),
        ]);
        let draft = draft(&cluster);
        assert_eq!(draft.source_count, 3);
        assert_eq!(draft.source_diversity, 2);
        assert_eq!(draft.occurred_at, at(1, 1));
        assert_eq!(draft.confidence, 1.0);
        assert_eq!(draft.status, "Confirmed");
        assert_eq!(draft.bias_indicator, "unknown");
        assert_eq!(draft.embedding, cluster.centroid());
        assert_eq!(
            draft.source_links.iter().map(|l| l.url.as_str()).collect::<Vec<_>>(),
            vec!["https://a.com/1", "https://b.com/1", "https://a.com/2"]
        );
    }

    #[tokio::test]
    async fn test_synthesize_two_source_cluster() {
        let cluster = cluster_of(vec![
            chip("A", "https://a.com/1", at(1, 0)),
            chip("B", "https://b.com/1", at(1, 1)),
        ]);
        let event = synthesizer(Arc::new(TemplateSummarizer::new()))
            .synthesize(&cluster)
            .await
            .unwrap();

        assert_eq!(event.event_id, "1c0a89caec6fd3e9");
        assert_eq!(event.title, "Tech event update from Austin, US (2 sources)");
        assert_eq!(event.confidence, 1.0);
        assert_eq!(event.status, "Confirmed");
        assert_eq!(event.bias_indicator, "low");
        assert_eq!(event.summary.what_happened, "2 sources report related developments in tech.");
        assert_eq!(event.ai_generated_notice, ne_core::AI_GENERATED_NOTICE);
    }

    #[tokio::test]
    async fn test_missing_summary_key_fails_synthesis() {
        let cluster = cluster_of(vec![chip("A", "https://a.com/1", at(1, 0))]);
        let err = synthesizer(Arc::new(MissingBias)).synthesize(&cluster).await.unwrap_err();
        match err {
            Error::Validation(message) => assert!(message.contains("bias_indicator")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_threshold_separates_unrelated_stories() {
        let clusterer = Clusterer::new(Arc::new(DeterministicEmbedder::default()), DEFAULT_SIMILARITY_THRESHOLD);
        let clusters = clusterer.cluster(vec![
            chip("A", "https://a.com/1", at(1, 0)),
            article("C", "https://c.com/1", "Flood warning", "rain and flood warning", at(2, 0)),
        ]);
        assert_eq!(clusters.len(), 2);
    }
}
