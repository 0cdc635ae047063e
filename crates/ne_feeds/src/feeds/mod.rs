use std::path::Path;

use async_trait::async_trait;
use ne_core::{Error, RawArticle, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub mod rss;

/// One feed to pull, plus the metadata stamped on every article it yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default = "default_place")]
    pub country: String,
    #[serde(default = "default_place")]
    pub city: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_source_name() -> String {
    "unknown".to_string()
}

fn default_place() -> String {
    "global".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_name: default_source_name(),
            country: default_place(),
            city: default_place(),
            category: default_category(),
        }
    }

    /// Feed URLs must be absolute http(s) URLs with a host.
    pub fn validate(&self) -> Result<Url> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| Error::Validation(format!("invalid feed URL {}: {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::Validation(format!(
                "feed URL must be an absolute HTTP(S) URL: {}",
                self.url
            )));
        }
        Ok(parsed)
    }
}

/// Read a JSON array of feed configs from disk and validate every entry.
pub fn load_feeds(path: impl AsRef<Path>) -> Result<Vec<FeedConfig>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let feeds: Vec<FeedConfig> = serde_json::from_str(&raw)?;
    for feed in &feeds {
        feed.validate()?;
    }
    Ok(feeds)
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse every usable item of one feed
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<RawArticle>>;
}
