use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use ne_core::{EmailSender, MonitoringSink, Result};
use tracing::info;

use crate::digest::{DailyDigest, DigestService};
use crate::publishing::{EventFilter, PublishingService};

/// Sender that only logs; stands in where no mail transport is configured.
#[derive(Debug, Clone)]
pub struct LogEmailSender {
    sender: String,
}

impl LogEmailSender {
    pub fn new(sender: impl Into<String>) -> Self {
        Self { sender: sender.into() }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_email(&self, recipient: &str, subject: &str, text_body: &str, html_body: &str) -> Result<()> {
        info!(
            "📧 {} -> {}: {} ({} text bytes, {} html bytes)",
            self.sender,
            recipient,
            subject,
            text_body.len(),
            html_body.len()
        );
        Ok(())
    }
}

pub struct EmailDigestService {
    publishing: Arc<PublishingService>,
    digest: DigestService,
    sender: Arc<dyn EmailSender>,
    monitoring: Arc<dyn MonitoringSink>,
}

impl EmailDigestService {
    pub fn new(
        publishing: Arc<PublishingService>,
        sender: Arc<dyn EmailSender>,
        monitoring: Arc<dyn MonitoringSink>,
    ) -> Self {
        Self {
            publishing,
            digest: DigestService::new(),
            sender,
            monitoring,
        }
    }

    pub async fn send_daily_digest(
        &self,
        recipient: &str,
        digest_date: NaiveDate,
        max_events: usize,
        filter: &EventFilter,
    ) -> Result<DailyDigest> {
        let events = self.publishing.list_events(filter).await?;
        let digest = self.digest.generate_daily_digest(events, digest_date, max_events);

        if let Err(e) = self
            .sender
            .send_email(recipient, &digest.subject, &digest.text_body, &digest.html_body)
            .await
        {
            self.monitoring
                .record_publishing_failure(&format!("digest_send_failed:{}", e));
            return Err(e);
        }

        info!("📬 Digest with {} events sent to {}", digest.included_event_ids.len(), recipient);
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;
    use ne_core::{Error, EventRepository, MonitoringStore};
    use ne_storage::InMemoryEventRepository;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send_email(&self, recipient: &str, subject: &str, _text: &str, _html: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Email("smtp unavailable".to_string()));
            }
            self.sent.lock().push((recipient.to_string(), subject.to_string()));
            Ok(())
        }
    }

    async fn setup(sender: Arc<RecordingSender>) -> (EmailDigestService, Arc<MonitoringStore>) {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository
            .upsert(&[
                event("chip", "tech", "Austin", 1.0, 1),
                event("flood", "climate", "Miami", 0.9, 2),
            ])
            .await
            .unwrap();
        let monitoring = Arc::new(MonitoringStore::default());
        let publishing = Arc::new(PublishingService::new(repository, monitoring.clone()));
        (EmailDigestService::new(publishing, sender, monitoring.clone()), monitoring)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    #[tokio::test]
    async fn test_sends_filtered_digest() {
        let sender = Arc::new(RecordingSender::default());
        let (service, _) = setup(sender.clone()).await;

        let filter = EventFilter {
            category: Some("tech".to_string()),
            ..EventFilter::default()
        };
        let digest = service
            .send_daily_digest("reader@example.com", date(), 10, &filter)
            .await
            .unwrap();

        assert_eq!(digest.included_event_ids, vec!["id-chip"]);
        let sent = sender.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "reader@example.com");
        assert_eq!(sent[0].1, "Daily AI News Digest - 2026-01-02");
    }

    #[tokio::test]
    async fn test_send_failure_is_counted() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..RecordingSender::default()
        });
        let (service, monitoring) = setup(sender).await;

        let result = service
            .send_daily_digest("reader@example.com", date(), 10, &EventFilter::default())
            .await;
        assert!(matches!(result, Err(Error::Email(_))));
        assert_eq!(monitoring.snapshot().publishing_failures, 1);
    }

    #[tokio::test]
    async fn test_log_sender_accepts_everything() {
        let sender = LogEmailSender::new("digest@example.com");
        assert!(sender.send_email("a@b.c", "s", "t", "<p>h</p>").await.is_ok());
    }
}
