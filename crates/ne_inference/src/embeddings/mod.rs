use ne_core::{Embedder, RawArticle};
use sha2::{Digest, Sha256};

pub const DEFAULT_DIMENSIONS: usize = 16;

/// Hash-based embedder: the same text always maps to the same vector.
///
/// Bytes come from SHA-256 of the UTF-8 text; when more than 32 dimensions are
/// requested, further blocks hash the text followed by a big-endian block
/// counter. Each byte is mapped linearly from `[0, 255]` to `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct DeterministicEmbedder {
    dimensions: usize,
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl DeterministicEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn embed_article(&self, article: &RawArticle) -> Vec<f32> {
        self.embed(&article.embedding_text())
    }

    fn digest_bytes(&self, text: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.dimensions);
        let mut block: u32 = 0;
        while bytes.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            if block > 0 {
                hasher.update(block.to_be_bytes());
            }
            bytes.extend_from_slice(&hasher.finalize());
            block += 1;
        }
        bytes.truncate(self.dimensions);
        bytes
    }
}

impl Embedder for DeterministicEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        self.digest_bytes(text)
            .into_iter()
            .map(|byte| (byte as f32 / 255.0) * 2.0 - 1.0)
            .collect()
    }
}
