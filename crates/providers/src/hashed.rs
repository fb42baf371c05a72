//! Feature-hashing bag-of-words model.
//!
//! Each lowercase word and each of its padded character trigrams is hashed
//! with blake3 into one of `dimensions` signed buckets, then the vector is
//! L2-normalized. Texts sharing words or word fragments end up close in
//! cosine space. Deterministic for a given dimension count.

use crate::local::LocalModel;
use crate::ProviderError;

const MODEL_VERSION: u32 = 1;
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.35;
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "due", "for", "in", "of", "on", "or", "the", "to",
];

#[derive(Debug, Clone)]
pub struct HashedBagModel {
    dimensions: usize,
    tokens: Vec<String>,
}

impl HashedBagModel {
    pub fn new(dimensions: usize) -> Result<Self, ProviderError> {
        if dimensions == 0 {
            return Err(ProviderError::InvalidInput(
                "hashed model needs at least one dimension".into(),
            ));
        }
        Ok(Self {
            dimensions,
            tokens: Vec::new(),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn tokenize(&mut self, text: &str) {
        self.tokens.clear();
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            self.tokens.push(word);
        }
    }

    fn accumulate(&self, feature: &str, weight: f32, out: &mut [f32]) {
        let digest = blake3::hash(feature.as_bytes());
        let bytes = digest.as_bytes();
        let mut index = [0u8; 8];
        index.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(index) % self.dimensions as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        out[bucket] += sign * weight;
    }
}

impl LocalModel for HashedBagModel {
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.tokenize(text);
        let mut out = vec![0.0f32; self.dimensions];
        for token in &self.tokens {
            self.accumulate(&format!("w:{token}"), WORD_WEIGHT, &mut out);
            let padded: Vec<char> = format!("#{token}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.accumulate(&format!("t:{gram}"), TRIGRAM_WEIGHT, &mut out);
            }
        }
        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in out.iter_mut() {
                *x /= norm;
            }
        }
        Ok(out)
    }

    fn model_id(&self) -> String {
        format!("hashed-bow-v{MODEL_VERSION}/{}", self.dimensions)
    }
}
