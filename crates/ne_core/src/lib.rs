pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use email::EmailSender;
pub use error::{Error, Result};
pub use models::{Embedder, Summarizer, SummaryPayload};
pub use monitoring::{AiCallRecord, MonitoringSink, MonitoringSnapshot, MonitoringStore};
pub use storage::EventRepository;
pub use types::{
    Event, EventDraft, RawArticle, SourceLink, Summary, SummarySections, AI_GENERATED_NOTICE,
    REQUIRED_SUMMARY_KEYS,
};

/// Cosine similarity between two vectors.
///
/// Mismatched lengths, empty inputs and zero-norm vectors all score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Component-wise mean of a set of equally sized vectors.
pub fn average<'a, I>(vectors: I) -> Vec<f32>
where
    I: IntoIterator<Item = &'a Vec<f32>>,
{
    let mut sums: Vec<f32> = Vec::new();
    let mut count = 0usize;

    for vector in vectors {
        if count == 0 {
            sums = vec![0.0; vector.len()];
        }
        for (sum, value) in sums.iter_mut().zip(vector.iter()) {
            *sum += value;
        }
        count += 1;
    }

    if count == 0 {
        return Vec::new();
    }

    sums.into_iter().map(|sum| sum / count as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let a = vec![0.2, -0.4, 0.9, 0.1];
        let b = vec![-0.7, 0.3, 0.5, 0.05];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = vec![0.5, -0.25, 1.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_average() {
        let vectors = vec![vec![1.0, -1.0], vec![0.0, 1.0], vec![2.0, 0.0]];
        assert_eq!(average(&vectors), vec![1.0, 0.0]);
        assert!(average(&Vec::<Vec<f32>>::new()).is_empty());
    }
}
