use std::sync::Arc;

use ne_core::{MonitoringSink, Settings};

pub mod clustering;
pub mod embeddings;
pub mod models;
pub mod summary;
pub mod synthesis;

pub use clustering::{Cluster, Clusterer, DEFAULT_SIMILARITY_THRESHOLD};
pub use embeddings::DeterministicEmbedder;
pub use models::{create_model, Config};
pub use summary::SummaryService;
pub use synthesis::EventSynthesizer;

/// The clustering and synthesis pieces wired from one set of settings.
#[derive(Debug)]
pub struct Pipeline {
    pub clusterer: Clusterer,
    pub synthesizer: EventSynthesizer,
}

impl Pipeline {
    pub fn from_settings(settings: &Settings, monitoring: Arc<dyn MonitoringSink>) -> ne_core::Result<Self> {
        let model = create_model(Some(Config::from_settings(settings)))?;
        let summaries = Arc::new(SummaryService::new(model, monitoring));
        Ok(Self {
            clusterer: Clusterer::new(
                Arc::new(DeterministicEmbedder::new(settings.embedding_dimensions)),
                settings.similarity_threshold,
            ),
            synthesizer: EventSynthesizer::new(summaries),
        })
    }
}

pub mod prelude {
    pub use super::{Cluster, Clusterer, DeterministicEmbedder, EventSynthesizer, Pipeline, SummaryService};
    pub use ne_core::{Error, Event, RawArticle, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use ne_core::MonitoringStore;

    #[test]
    fn test_pipeline_from_default_settings() {
        let pipeline = Pipeline::from_settings(&Settings::default(), Arc::new(MonitoringStore::default())).unwrap();
        assert_eq!(pipeline.clusterer.threshold(), DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_pipeline_rejects_chat_without_key() {
        let settings = Settings {
            summarizer_model: "chat".to_string(),
            ..Settings::default()
        };
        assert!(Pipeline::from_settings(&settings, Arc::new(MonitoringStore::default())).is_err());
    }
}
