use std::sync::Arc;

use ne_core::{Error, EventRepository, Result};

pub mod backends;

pub use backends::*;

/// Build a repository from its CLI name.
pub fn create_storage(kind: &str) -> Result<Arc<dyn EventRepository>> {
    match kind.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(InMemoryEventRepository::new())),
        other => Err(Error::Config(format!(
            "Unknown storage backend: {}. Available backends: memory",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
}
