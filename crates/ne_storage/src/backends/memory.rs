use std::collections::HashMap;

use async_trait::async_trait;
use ne_core::{Event, EventRepository, Result};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Store {
    events: HashMap<String, Event>,
    // slug -> event id of the latest event upserted under that slug
    slugs: HashMap<String, String>,
}

impl Store {
    fn resolve(&self, id: &str) -> Option<&String> {
        self.events
            .get_key_value(id)
            .map(|(key, _)| key)
            .or_else(|| self.slugs.get(id))
    }

    fn unlink_slug(&mut self, event: &Event) {
        if self.slugs.get(&event.slug) == Some(&event.event_id) {
            self.slugs.remove(&event.slug);
        }
    }
}

/// Events held in process memory, keyed by event id with a slug index.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    store: RwLock<Store>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn upsert(&self, events: &[Event]) -> Result<()> {
        let mut store = self.store.write().await;
        for event in events {
            debug!("💾 Upserting event {} ({})", event.event_id, event.slug);
            if let Some(previous) = store.events.insert(event.event_id.clone(), event.clone()) {
                store.unlink_slug(&previous);
            }
            store.slugs.insert(event.slug.clone(), event.event_id.clone());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let store = self.store.read().await;
        let mut events: Vec<Event> = store.events.values().cloned().collect();
        events.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| a.slug.cmp(&b.slug))
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        Ok(events)
    }

    async fn get_by_identity(&self, id: &str) -> Result<Option<Event>> {
        let store = self.store.read().await;
        Ok(store.resolve(id).and_then(|event_id| store.events.get(event_id)).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        let Some(event_id) = store.resolve(id).cloned() else {
            return Ok(false);
        };
        match store.events.remove(&event_id) {
            Some(removed) => {
                store.unlink_slug(&removed);
                debug!("🗑️ Deleted event {}", event_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ne_core::SummarySections;

    fn event(slug: &str, event_id: &str, hour: u32, title: &str) -> Event {
        Event {
            event_id: event_id.to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            category: "tech".to_string(),
            country: "US".to_string(),
            city: "Austin".to_string(),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap(),
            confidence: 1.0,
            source_diversity: 2,
            source_count: 2,
            embedding: vec![0.0; 16],
            source_links: Vec::new(),
            summary: SummarySections::default(),
            status: "Confirmed".to_string(),
            bias_indicator: "low".to_string(),
            ai_generated_notice: ne_core::AI_GENERATED_NOTICE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_event_id() {
        let repo = InMemoryEventRepository::new();
        repo.upsert(&[event("a", "id-a", 1, "first")]).await.unwrap();
        repo.upsert(&[event("a", "id-a", 1, "second")]).await.unwrap();

        let events = repo.list().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "second");
    }

    #[tokio::test]
    async fn test_shared_slug_keeps_every_event() {
        let repo = InMemoryEventRepository::new();
        repo.upsert(&[event("same", "id-1", 1, "one"), event("same", "id-2", 2, "two")])
            .await
            .unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.get_by_identity("id-1").await.unwrap().unwrap().title, "one");
        assert_eq!(repo.get_by_identity("same").await.unwrap().unwrap().title, "two");
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let repo = InMemoryEventRepository::new();
        repo.upsert(&[event("old", "id-old", 1, "old"), event("new", "id-new", 5, "new")])
            .await
            .unwrap();

        let slugs: Vec<String> = repo.list().await.unwrap().into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_get_by_slug_or_event_id() {
        let repo = InMemoryEventRepository::new();
        repo.upsert(&[event("a-slug", "id-a", 1, "a")]).await.unwrap();

        assert!(repo.get_by_identity("a-slug").await.unwrap().is_some());
        assert!(repo.get_by_identity("id-a").await.unwrap().is_some());
        assert!(repo.get_by_identity("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_slug_clears_both_keys() {
        let repo = InMemoryEventRepository::new();
        repo.upsert(&[event("a-slug", "id-a", 1, "a")]).await.unwrap();

        assert!(repo.delete("a-slug").await.unwrap());
        assert!(!repo.delete("id-a").await.unwrap());
        assert!(repo.get_by_identity("a-slug").await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
