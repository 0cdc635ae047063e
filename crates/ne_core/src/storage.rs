use async_trait::async_trait;

use crate::types::Event;
use crate::Result;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert or replace events, keyed by event id
    async fn upsert(&self, events: &[Event]) -> Result<()>;

    /// All stored events, most recent first
    async fn list(&self) -> Result<Vec<Event>>;

    /// Look an event up by event id, or by slug
    async fn get_by_identity(&self, id: &str) -> Result<Option<Event>>;

    /// Remove an event by event id or slug. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}
