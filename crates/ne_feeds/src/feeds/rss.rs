use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ne_core::{Error, RawArticle, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{FeedConfig, FeedSource};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// RSS 2.0 nests items inside `<channel>`; RSS 1.0 (`<rdf:RDF>`) places them
/// next to it.
#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    channel: Option<RssChannel>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", alias = "date", alias = "dc:date", default)]
    pub_date: Option<String>,
}

/// Fetches RSS 2.0 and RSS 1.0 feeds over HTTP.
#[derive(Debug, Clone)]
pub struct RssFetcher {
    client: Client,
    timeout: Duration,
}

impl Default for RssFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl RssFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    async fn load_feed(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for RssFetcher {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<RawArticle>> {
        feed.validate()?;
        info!("📡 Fetching feed {} ({})", feed.source_name, feed.url);
        let xml = self.load_feed(&feed.url).await?;
        let articles = parse_feed(&xml, feed, Utc::now())?;
        if articles.is_empty() {
            warn!("⚠️ Feed {} yielded no articles", feed.source_name);
        } else {
            info!("✨ {} articles from {}", articles.len(), feed.source_name);
        }
        Ok(articles)
    }
}

/// Parse an RSS 2.0 or RSS 1.0 document into articles, skipping items without
/// title or link. A document with neither a channel nor items is a feed error.
///
/// `fetched_at` stands in for missing or unparseable publication dates.
pub fn parse_feed(xml: &str, feed: &FeedConfig, fetched_at: DateTime<Utc>) -> Result<Vec<RawArticle>> {
    let document: FeedDocument = quick_xml::de::from_str(xml)
        .map_err(|e| Error::Feed(format!("Failed to parse RSS from {}: {}", feed.url, e)))?;

    let items = match document.channel {
        Some(channel) => channel.items.into_iter().chain(document.items).collect::<Vec<_>>(),
        None if document.items.is_empty() => {
            return Err(Error::Feed(format!("No RSS channel or items in {}", feed.url)));
        }
        None => document.items,
    };

    let mut articles = Vec::with_capacity(items.len());
    for item in items {
        let title = clean(item.title);
        let link = clean(item.link);
        if title.is_empty() || link.is_empty() {
            debug!("Skipping item without title or link in {}", feed.url);
            continue;
        }

        articles.push(RawArticle {
            source_name: feed.source_name.clone(),
            title,
            link,
            description: clean(item.description),
            published_at: parse_date(item.pub_date.as_deref(), fetched_at),
            country: feed.country.clone(),
            city: feed.city.clone(),
            category: feed.category.clone(),
        });
    }
    Ok(articles)
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn parse_date(value: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| {
            DateTime::parse_from_rfc2822(v)
                .or_else(|_| DateTime::parse_from_rfc3339(v))
                .ok()
        })
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(fallback)
}
