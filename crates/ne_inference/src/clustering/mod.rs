//! Greedy single-pass grouping of articles into clusters.
//!
//! Articles are taken strictly in arrival order. Each one is compared against
//! the centroid of every existing cluster and joins the best match when the
//! score reaches the threshold; otherwise it opens a new cluster. Earlier
//! assignments are never revisited, so the output depends on input order.

use std::sync::Arc;

use ne_core::{average, cosine_similarity, Embedder, RawArticle};
use tracing::debug;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.80;

/// Articles believed to describe the same happening.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<RawArticle>,
    centroid: Vec<f32>,
}

impl Cluster {
    fn new(article: RawArticle, embedding: Vec<f32>) -> Self {
        Self {
            members: vec![article],
            centroid: embedding,
        }
    }

    /// Members in the order they were appended
    pub fn members(&self) -> &[RawArticle] {
        &self.members
    }

    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Clusterer {
    embedder: Arc<dyn Embedder>,
    threshold: f32,
}

impl Clusterer {
    pub fn new(embedder: Arc<dyn Embedder>, threshold: f32) -> Self {
        Self { embedder, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn cluster<I>(&self, articles: I) -> Vec<Cluster>
    where
        I: IntoIterator<Item = RawArticle>,
    {
        let mut clusters = Vec::new();
        for article in articles {
            self.assign(&mut clusters, article);
        }
        clusters
    }

    /// Place one article into `clusters`, returning the index it landed in.
    pub fn assign(&self, clusters: &mut Vec<Cluster>, article: RawArticle) -> usize {
        let embedding = self.embedder.embed(&article.embedding_text());

        // Strictly-greater replacement keeps the earliest cluster on ties.
        let mut best: Option<(usize, f32)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let score = cosine_similarity(&embedding, &cluster.centroid);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        match best {
            Some((idx, score)) if score >= self.threshold => {
                debug!("🔗 {} joins cluster {} (score {:.3})", article.link, idx, score);
                let cluster = &mut clusters[idx];
                cluster.members.push(article);
                cluster.centroid = self.recompute_centroid(&cluster.members);
                idx
            }
            _ => {
                debug!("🆕 {} opens cluster {}", article.link, clusters.len());
                clusters.push(Cluster::new(article, embedding));
                clusters.len() - 1
            }
        }
    }

    /// Mean of fresh embeddings of every member, recomputed from the text.
    fn recompute_centroid(&self, members: &[RawArticle]) -> Vec<f32> {
        let embeddings: Vec<Vec<f32>> = members
            .iter()
            .map(|member| self.embedder.embed(&member.embedding_text()))
            .collect();
        average(&embeddings)
    }
}
