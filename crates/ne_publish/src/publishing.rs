use std::sync::Arc;

use ne_core::{Event, EventRepository, MonitoringSink, Result};
use serde::{Deserialize, Serialize};

/// Optional case-insensitive filters; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub category: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            wanted
                .as_deref()
                .filter(|w| !w.is_empty())
                .map_or(true, |w| w.to_lowercase() == actual.to_lowercase())
        }

        field_matches(&self.category, &event.category)
            && field_matches(&self.country, &event.country)
            && field_matches(&self.city, &event.city)
    }
}

pub struct PublishingService {
    repository: Arc<dyn EventRepository>,
    monitoring: Arc<dyn MonitoringSink>,
}

impl PublishingService {
    pub fn new(repository: Arc<dyn EventRepository>, monitoring: Arc<dyn MonitoringSink>) -> Self {
        Self { repository, monitoring }
    }

    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let events = self.repository.list().await?;
        Ok(events.into_iter().filter(|e| filter.matches(e)).collect())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let event = self.repository.get_by_identity(id).await?;
        if event.is_none() {
            self.monitoring.record_publishing_failure(&format!("event_not_found:{}", id));
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;
    use ne_core::MonitoringStore;
    use ne_storage::InMemoryEventRepository;

    async fn service() -> (PublishingService, Arc<MonitoringStore>) {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository
            .upsert(&[
                event("chip", "tech", "Austin", 1.0, 1),
                event("flood", "climate", "Miami", 0.9, 2),
            ])
            .await
            .unwrap();
        let monitoring = Arc::new(MonitoringStore::default());
        (PublishingService::new(repository, monitoring.clone()), monitoring)
    }

    #[tokio::test]
    async fn test_filters_case_insensitively() {
        let (service, _) = service().await;

        let all = service.list_events(&EventFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filter = EventFilter {
            category: Some("TECH".to_string()),
            city: Some("austin".to_string()),
            ..EventFilter::default()
        };
        let tech = service.list_events(&filter).await.unwrap();
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].slug, "chip");

        let none = service
            .list_events(&EventFilter {
                country: Some("IN".to_string()),
                ..EventFilter::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_missing_event_is_counted() {
        let (service, monitoring) = service().await;
        assert!(service.get_event("chip").await.unwrap().is_some());
        assert!(service.get_event("nope").await.unwrap().is_none());
        assert_eq!(monitoring.snapshot().publishing_failures, 1);
    }
}
