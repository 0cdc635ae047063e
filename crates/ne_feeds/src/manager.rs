//! End-to-end ingestion: fetch feeds, cluster, synthesize, store, report.
//!
//! Feeds are fetched concurrently but flattened in feed-list order, then item
//! order, before clustering starts. Clustering itself runs on one task in that
//! order. Summaries for different events may run concurrently.
//!
//! Failure policy: a failing feed or a failing event is recorded in the
//! [`IngestionReport`] and the rest of the batch continues. All failures of a
//! pass are reported once, aggregated, to the monitoring sink. Only a storage
//! failure aborts the pass; it joins the same aggregated report first.

use std::sync::Arc;

use futures::future::join_all;
use ne_core::{Event, EventRepository, MonitoringSink, RawArticle, Result};
use ne_inference::{Cluster, Clusterer, EventSynthesizer, Pipeline};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::feeds::{FeedConfig, FeedSource};

const DEFAULT_MAX_CONCURRENT_SUMMARIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFailure {
    pub links: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub articles: usize,
    pub clusters: usize,
    pub events: Vec<Event>,
    pub failed_feeds: Vec<FeedFailure>,
    pub failed_events: Vec<EventFailure>,
}

impl IngestionReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_feeds.is_empty() || !self.failed_events.is_empty()
    }

    /// One human-readable line covering every failure of the pass.
    pub fn failure_summary(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }

        let mut parts = Vec::new();
        if !self.failed_feeds.is_empty() {
            let details = self
                .failed_feeds
                .iter()
                .map(|f| format!("{}: {}", f.url, f.reason))
                .collect::<Vec<_>>()
                .join("; ");
            parts.push(format!("{} feed(s) failed ({})", self.failed_feeds.len(), details));
        }
        if !self.failed_events.is_empty() {
            let details = self
                .failed_events
                .iter()
                .map(|f| format!("[{}]: {}", f.links.join(", "), f.reason))
                .collect::<Vec<_>>()
                .join("; ");
            parts.push(format!("{} event(s) failed ({})", self.failed_events.len(), details));
        }
        Some(parts.join("; "))
    }
}

pub struct IngestionService {
    repository: Arc<dyn EventRepository>,
    source: Arc<dyn FeedSource>,
    clusterer: Clusterer,
    synthesizer: EventSynthesizer,
    monitoring: Arc<dyn MonitoringSink>,
    semaphore: Arc<Semaphore>,
}

impl IngestionService {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        source: Arc<dyn FeedSource>,
        pipeline: Pipeline,
        monitoring: Arc<dyn MonitoringSink>,
    ) -> Self {
        Self {
            repository,
            source,
            clusterer: pipeline.clusterer,
            synthesizer: pipeline.synthesizer,
            monitoring,
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_SUMMARIES)),
        }
    }

    pub fn with_max_concurrent_summaries(mut self, permits: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    /// Fetch every feed concurrently and flatten in feed order, then item order.
    pub async fn fetch_all(&self, feeds: &[FeedConfig]) -> (Vec<RawArticle>, Vec<FeedFailure>) {
        let results = join_all(feeds.iter().map(|feed| self.source.fetch(feed))).await;

        let mut articles = Vec::new();
        let mut failures = Vec::new();
        for (feed, result) in feeds.iter().zip(results) {
            match result {
                Ok(mut items) => articles.append(&mut items),
                Err(e) => {
                    warn!("⚠️ Feed {} failed: {}", feed.url, e);
                    failures.push(FeedFailure {
                        url: feed.url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (articles, failures)
    }

    pub async fn ingest(&self, feeds: &[FeedConfig]) -> Result<IngestionReport> {
        info!("📡 Ingesting {} feeds", feeds.len());
        let (articles, failed_feeds) = self.fetch_all(feeds).await;
        self.run(articles, failed_feeds).await
    }

    /// Run the pipeline on articles that were already fetched.
    pub async fn ingest_articles(&self, articles: Vec<RawArticle>) -> Result<IngestionReport> {
        self.run(articles, Vec::new()).await
    }

    async fn run(&self, articles: Vec<RawArticle>, failed_feeds: Vec<FeedFailure>) -> Result<IngestionReport> {
        let article_count = articles.len();
        let clusters = self.clusterer.cluster(articles);
        info!("🔗 {} articles grouped into {} clusters", article_count, clusters.len());

        let results = join_all(clusters.iter().map(|cluster| self.synthesize(cluster))).await;

        let mut report = IngestionReport {
            articles: article_count,
            clusters: clusters.len(),
            failed_feeds,
            ..IngestionReport::default()
        };
        for (cluster, result) in clusters.iter().zip(results) {
            match result {
                Ok(event) => report.events.push(event),
                Err(e) => {
                    warn!("⚠️ Event synthesis failed: {}", e);
                    report.failed_events.push(EventFailure {
                        links: cluster.members().iter().map(|a| a.link.clone()).collect(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let stored = self.repository.upsert(&report.events).await;

        let mut reasons: Vec<String> = report.failure_summary().into_iter().collect();
        if let Err(e) = &stored {
            reasons.push(format!("storage upsert failed: {}", e));
        }
        if !reasons.is_empty() {
            self.monitoring.record_ingestion_failure(&reasons.join("; "));
        }

        stored?;
        info!("💾 Stored {} events", report.events.len());
        Ok(report)
    }

    async fn synthesize(&self, cluster: &Cluster) -> Result<Event> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ne_core::Error::External(e.into()))?;
        self.synthesizer.synthesize(cluster).await
    }
}
