//! Page metadata for a published event: canonical URL, Open Graph, Twitter
//! card and a schema.org `NewsArticle` block.

use ne_core::Event;
use serde::Serialize;

const SITE_NAME: &str = "AI News Publisher";
const DESCRIPTION_CHARS: usize = 155;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwitterCard {
    pub card: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticleLd {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub headline: String,
    pub description: String,
    #[serde(rename = "datePublished")]
    pub date_published: String,
    #[serde(rename = "mainEntityOfPage")]
    pub main_entity_of_page: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
    pub json_ld: NewsArticleLd,
}

pub fn build_seo_metadata(event: &Event, location_suffix: Option<&str>, base_url: &str) -> SeoMetadata {
    let base_url = base_url.trim_end_matches('/');
    let suffix = location_suffix
        .filter(|s| !s.is_empty())
        .map(|s| format!(" - {}", s))
        .unwrap_or_default();

    let title = format!("{}{} | {}", event.title, suffix, SITE_NAME);
    let description: String = event.summary.what_happened.chars().take(DESCRIPTION_CHARS).collect();
    let canonical_url = format!("{}/events/{}", base_url, event.slug);

    SeoMetadata {
        open_graph: OpenGraph {
            title: title.clone(),
            description: description.clone(),
            url: canonical_url.clone(),
            image: format!("{}/og/{}.png", base_url, event.slug),
        },
        twitter: TwitterCard {
            card: "summary_large_image".to_string(),
            title: title.clone(),
            description: description.clone(),
        },
        json_ld: NewsArticleLd {
            context: "https://schema.org".to_string(),
            kind: "NewsArticle".to_string(),
            headline: title.clone(),
            description: description.clone(),
            date_published: event.occurred_at.to_rfc3339(),
            main_entity_of_page: canonical_url.clone(),
        },
        title,
        description,
        canonical_url,
    }
}
