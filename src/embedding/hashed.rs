//! Feature-hashing embedder.
//!
//! Each word token is hashed into one of `dimension` buckets with a hashed
//! sign, counts are accumulated and the result is L2-normalized. Texts that
//! share vocabulary land close together, which is enough for the CLI and
//! for tests that need a real, deterministic embedding source.

use std::fmt;

use ahash::RandomState;

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::embedding::embedder::Embedder;
use crate::error::{LorekeeperError, Result};
use crate::vector::core::vector::Vector;

/// Default output dimension.
pub const DEFAULT_DIMENSION: usize = 256;

// Fixed seeds keep bucket assignment stable across processes.
const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// # Examples
///
/// ```
/// use lorekeeper::embedding::{Embedder, HashedEmbedder};
///
/// let embedder = HashedEmbedder::new(64).unwrap();
/// let vectors = embedder.embed_batch(&["the goblin attacks", "the goblin attacks"]).unwrap();
///
/// assert_eq!(vectors[0], vectors[1]);
/// assert!(vectors[0].is_unit());
/// ```
#[derive(Clone)]
pub struct HashedEmbedder {
    dimension: usize,
    tokenizer: RegexTokenizer,
    hasher: RandomState,
}

impl HashedEmbedder {
    /// Create an embedder with the given output dimension (at least 2).
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension < 2 {
            return Err(LorekeeperError::invalid_config(format!(
                "hashed embedder dimension must be at least 2, got {dimension}"
            )));
        }
        Ok(Self {
            dimension,
            tokenizer: RegexTokenizer::default(),
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        })
    }

    fn embed_one(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dimension];
        let tokens = self.tokenizer.tokenize(text);

        for token in &tokens {
            let hash = self.hasher.hash_one(token.as_str());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            data[bucket] += sign;
        }

        let mut vector = Vector::new(data);
        if vector.norm() == 0.0 {
            // No tokens, or every bucket cancelled out.
            vector.data[0] = 1.0;
        }
        vector.normalize();
        vector
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            tokenizer: RegexTokenizer::default(),
            hasher: RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
        }
    }
}

impl fmt::Debug for HashedEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedEmbedder")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl Embedder for HashedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashed"
    }
}
