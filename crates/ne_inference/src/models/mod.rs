use std::sync::Arc;
use std::time::Duration;

use ne_core::{Error, Result, Settings, Summarizer};

pub mod chat;
pub mod template;

pub use chat::ChatSummarizer;
pub use template::TemplateSummarizer;

/// Which summarizer to build and how to reach it.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_name: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: "template".to_string(),
            api_key: None,
            base_url: None,
            chat_model: None,
            timeout: chat::DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model_name: settings.summarizer_model.clone(),
            api_key: settings.openai_api_key.clone(),
            base_url: settings.summarizer_base_url.clone(),
            chat_model: settings.summarizer_chat_model.clone(),
            timeout: Duration::from_secs(settings.summarizer_timeout_secs),
        }
    }
}

pub fn create_model(config: Option<Config>) -> Result<Arc<dyn Summarizer>> {
    let config = config.unwrap_or_default();
    match config.model_name.to_lowercase().as_str() {
        "template" => Ok(Arc::new(TemplateSummarizer::new())),
        "chat" | "openai" => Ok(Arc::new(ChatSummarizer::new(
            config.api_key,
            config.base_url.as_deref(),
            config.chat_model,
            config.timeout,
        )?)),
        other => Err(Error::Config(format!(
            "Unknown summarizer model: {}. Available models: template, chat",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_model() {
        let model = create_model(None).unwrap();
        assert_eq!(model.name(), "template-v1");
    }

    #[test]
    fn test_create_chat_model() {
        let config = Config {
            model_name: "chat".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert!(create_model(Some(config)).is_ok());
    }

    #[test]
    fn test_config_from_settings_reaches_custom_endpoint() {
        let settings = Settings {
            summarizer_model: "chat".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            summarizer_base_url: Some("http://localhost:11434/v1".to_string()),
            summarizer_chat_model: Some("llama3".to_string()),
            summarizer_timeout_secs: 7,
            ..Settings::default()
        };
        let config = Config::from_settings(&settings);
        assert_eq!(config.timeout, Duration::from_secs(7));

        let model = create_model(Some(config)).unwrap();
        assert_eq!(model.name(), "llama3");
        assert!(format!("{:?}", model).contains("http://localhost:11434/v1"));
    }

    #[test]
    fn test_unknown_model() {
        let config = Config {
            model_name: "oracle".to_string(),
            ..Config::default()
        };
        assert!(matches!(create_model(Some(config)), Err(Error::Config(_))));
    }
}
