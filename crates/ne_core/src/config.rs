use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Runtime settings, read from the environment with sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding_dimensions: usize,
    pub similarity_threshold: f32,
    pub base_url: String,
    pub digest_max_events: usize,
    pub digest_sender_email: String,
    pub openai_api_key: Option<String>,
    pub summarizer_model: String,
    pub summarizer_base_url: Option<String>,
    pub summarizer_chat_model: Option<String>,
    pub summarizer_timeout_secs: u64,
    pub feed_timeout_secs: u64,
    pub cost_spike_multiplier: f64,
    pub cost_window: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embedding_dimensions: 16,
            similarity_threshold: 0.80,
            base_url: "https://news.example.com".to_string(),
            digest_max_events: 10,
            digest_sender_email: "digest@example.com".to_string(),
            openai_api_key: None,
            summarizer_model: "template".to_string(),
            summarizer_base_url: None,
            summarizer_chat_model: None,
            summarizer_timeout_secs: 30,
            feed_timeout_secs: 10,
            cost_spike_multiplier: 2.0,
            cost_window: 50,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            embedding_dimensions: parse_var(&lookup, "EMBEDDING_DIMENSIONS", defaults.embedding_dimensions)?,
            similarity_threshold: parse_var(&lookup, "EVENT_SIMILARITY_THRESHOLD", defaults.similarity_threshold)?,
            base_url: lookup("PUBLISHER_BASE_URL").unwrap_or(defaults.base_url),
            digest_max_events: parse_var(&lookup, "DIGEST_MAX_EVENTS", defaults.digest_max_events)?,
            digest_sender_email: lookup("DIGEST_SENDER_EMAIL").unwrap_or(defaults.digest_sender_email),
            openai_api_key: non_blank(lookup("OPENAI_API_KEY")),
            summarizer_model: lookup("SUMMARIZER_MODEL").unwrap_or(defaults.summarizer_model),
            summarizer_base_url: non_blank(lookup("SUMMARIZER_BASE_URL")),
            summarizer_chat_model: non_blank(lookup("SUMMARIZER_CHAT_MODEL")),
            summarizer_timeout_secs: parse_var(&lookup, "SUMMARIZER_TIMEOUT_SECS", defaults.summarizer_timeout_secs)?,
            feed_timeout_secs: parse_var(&lookup, "FEED_TIMEOUT_SECS", defaults.feed_timeout_secs)?,
            cost_spike_multiplier: parse_var(&lookup, "AI_COST_SPIKE_MULTIPLIER", defaults.cost_spike_multiplier)?,
            cost_window: parse_var(&lookup, "AI_COST_WINDOW", defaults.cost_window)?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", name, raw))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.embedding_dimensions, 16);
        assert_eq!(settings.similarity_threshold, 0.80);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let settings = Settings::from_lookup(lookup(&[
            ("EMBEDDING_DIMENSIONS", "32"),
            ("EVENT_SIMILARITY_THRESHOLD", "0.9"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(settings.embedding_dimensions, 32);
        assert_eq!(settings.similarity_threshold, 0.9);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_summarizer_endpoint_settings() {
        let settings = Settings::from_lookup(lookup(&[
            ("SUMMARIZER_BASE_URL", "http://localhost:11434/v1"),
            ("SUMMARIZER_CHAT_MODEL", "llama3"),
            ("SUMMARIZER_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.summarizer_base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(settings.summarizer_chat_model.as_deref(), Some("llama3"));
        assert_eq!(settings.summarizer_timeout_secs, 5);
        assert_eq!(Settings::default().summarizer_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = Settings::from_lookup(lookup(&[("DIGEST_MAX_EVENTS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("DIGEST_MAX_EVENTS"));
    }
}
