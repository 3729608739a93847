//! One-hot encoding of SMILES strings.

use std::sync::Arc;

use candle_core::{Device, Tensor};

use crate::vocabulary::Vocabulary;

/// A `(1, max_length, vocab_size)` one-hot matrix, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInput {
    data: Vec<f32>,
    max_length: usize,
    vocab_size: usize,
}

impl EncodedInput {
    pub fn shape(&self) -> (usize, usize, usize) {
        (1, self.max_length, self.vocab_size)
    }

    /// Entry at sequence position `j`, vocabulary column `k`.
    pub fn get(&self, j: usize, k: usize) -> f32 {
        if j >= self.max_length || k >= self.vocab_size {
            return 0.0;
        }
        self.data[j * self.vocab_size + k]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of positions holding a known character.
    pub fn active_rows(&self) -> usize {
        self.data
            .chunks(self.vocab_size.max(1))
            .filter(|row| row.iter().any(|&x| x != 0.0))
            .count()
    }

    pub fn to_tensor(&self, device: &Device) -> candle_core::Result<Tensor> {
        Tensor::from_slice(&self.data, self.shape(), device)
    }
}

/// Maps each character to a one-hot row; unknown characters leave the
/// row empty and input past `max_length` is dropped.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    vocabulary: Arc<Vocabulary>,
    max_length: usize,
}

impl OneHotEncoder {
    pub fn new(vocabulary: Vocabulary, max_length: usize) -> Self {
        Self {
            vocabulary: Arc::new(vocabulary),
            max_length,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Never fails; validate the string before trusting the result.
    pub fn encode(&self, smiles: &str) -> EncodedInput {
        let vocab_size = self.vocab_size();
        let mut data = vec![0.0f32; self.max_length * vocab_size];
        for (j, ch) in smiles.chars().take(self.max_length).enumerate() {
            if let Some(k) = self.vocabulary.get(ch) {
                data[j * vocab_size + k] = 1.0;
            }
        }
        EncodedInput {
            data,
            max_length: self.max_length,
            vocab_size,
        }
    }
}
