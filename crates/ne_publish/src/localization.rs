use std::collections::HashMap;

use ne_core::Event;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const NO_IMPACT: &str = "No direct local impact identified at this time.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl Location {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: None,
            city: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    fn cache_key(&self, event_id: &str) -> String {
        format!(
            "{}:{}:{}:{}",
            event_id,
            self.country,
            self.state.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or("")
        )
    }
}

/// Explains what an event means for a reader's location. Results are cached.
#[derive(Debug, Default)]
pub struct LocalizationService {
    cache: Mutex<HashMap<String, String>>,
}

impl LocalizationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_impact(&self, event: &Event, location: &Location) -> String {
        let key = location.cache_key(&event.event_id);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let same_country = location.country.eq_ignore_ascii_case(&event.country);
        let same_city = location
            .city
            .as_deref()
            .is_some_and(|city| city.eq_ignore_ascii_case(&event.city));

        let text = if same_country || same_city {
            let locality = [location.city.as_deref(), location.state.as_deref(), Some(location.country.as_str())]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Why this matters to YOU: Expected spillover effects for residents and organizations in {}.",
                locality
            )
        } else {
            NO_IMPACT.to_string()
        };

        self.cache.lock().insert(key, text.clone());
        text
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }
}
