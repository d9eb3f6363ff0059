//! Feature-hashing embedder.
//!
//! Each lower-cased word token is hashed (SHA-256) into one of `dims` buckets
//! with a sign bit; the bucket counts are L2-normalized. Deterministic and model
//! free; suited to lexical similarity within a single document.

use sha2::{Digest, Sha256};

use madforge_shared::{Embedder, MadError, Result};

/// Default vector length, matching common small sentence-embedding models.
pub const DEFAULT_DIMS: usize = 384;

/// Largest accepted vector length.
pub const MAX_DIMS: usize = 8192;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 || dims > MAX_DIMS {
            return Err(MadError::config(format!(
                "embedding dimensions must be between 1 and {MAX_DIMS}, got {dims}"
            )));
        }
        Ok(Self {
            dims,
            name: format!("hashing-{dims}"),
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0f32; self.dims];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                % self.dims;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn vectors_have_fixed_length_and_unit_norm() {
        let emb = HashingEmbedder::new(64).unwrap();
        let v = emb.encode("Widgets are small and cheap.").unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(emb.name(), "hashing-64");
    }

    #[test]
    fn encoding_is_deterministic_and_case_insensitive() {
        let emb = HashingEmbedder::new(DEFAULT_DIMS).unwrap();
        let a = emb.encode("Quarterly Revenue").unwrap();
        let b = emb.encode("quarterly revenue").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn similar_text_scores_higher() {
        let emb = HashingEmbedder::new(DEFAULT_DIMS).unwrap();
        let base = emb.encode("the widget factory ships widgets").unwrap();
        let near = emb.encode("widget factory ships").unwrap();
        let far = emb.encode("ocean tides and lunar cycles").unwrap();
        assert!(cosine(&base, &near) > cosine(&base, &far));
    }

    #[test]
    fn text_without_tokens_is_zero_vector() {
        let emb = HashingEmbedder::new(8).unwrap();
        assert_eq!(emb.encode(" -- ").unwrap(), vec![0.0; 8]);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(HashingEmbedder::new(0).is_err());
        assert!(HashingEmbedder::new(MAX_DIMS + 1).is_err());
    }
}
