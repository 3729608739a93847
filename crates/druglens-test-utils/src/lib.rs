//! Shared testing utilities for the DrugLens workspace.
//!
//! Provides a small vocabulary, scorers with fixed behaviour, and a
//! writer for a tiny but real sequential model on disk.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use candle_core::{Device, Tensor};
use druglens_config::{ModelConfig, ModelFormat};
use druglens_model::{EncodedInput, ModelError, OneHotEncoder, Scorer, Vocabulary};
use tempfile::TempDir;

/// Characters of the test vocabulary, in index order.
pub const TINY_TOKENS: &str = "CNOSFclnos()[]=#+-123456@H";

pub fn tiny_vocabulary() -> Vocabulary {
    let entries = TINY_TOKENS.chars().enumerate().map(|(i, c)| (c.to_string(), i as i64));
    match Vocabulary::from_entries(entries) {
        Ok(vocab) => vocab,
        Err(e) => panic!("test vocabulary is invalid: {e}"),
    }
}

pub fn tiny_encoder(max_length: usize) -> OneHotEncoder {
    OneHotEncoder::new(tiny_vocabulary(), max_length)
}

/// Always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct ConstantScorer(pub f32);

impl Scorer for ConstantScorer {
    fn score(&self, _input: &EncodedInput) -> Result<f32, ModelError> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("constant scorer ({})", self.0)
    }
}

/// Always fails, like a model whose runtime broke.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn score(&self, _input: &EncodedInput) -> Result<f32, ModelError> {
        Err(ModelError::Inference("scorer configured to fail".into()))
    }

    fn describe(&self) -> String {
        "failing scorer".into()
    }
}

/// Blocks the calling thread before answering.
#[derive(Debug, Clone, Copy)]
pub struct SlowScorer {
    pub delay: Duration,
    pub score: f32,
}

impl Scorer for SlowScorer {
    fn score(&self, _input: &EncodedInput) -> Result<f32, ModelError> {
        std::thread::sleep(self.delay);
        Ok(self.score)
    }

    fn describe(&self) -> String {
        format!("slow scorer ({:?})", self.delay)
    }
}

/// Scores the fraction of positions holding a known character.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillScorer;

impl Scorer for FillScorer {
    fn score(&self, input: &EncodedInput) -> Result<f32, ModelError> {
        let (_, steps, _) = input.shape();
        Ok(input.active_rows() as f32 / steps.max(1) as f32)
    }

    fn describe(&self) -> String {
        "fill scorer".into()
    }
}

/// Model files written to a temporary directory that lives as long as
/// this value.
pub struct TinyModel {
    pub dir: TempDir,
    pub architecture: PathBuf,
    pub weights: PathBuf,
    pub vocabulary: PathBuf,
    pub max_length: usize,
}

impl TinyModel {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            format: ModelFormat::Sequential,
            architecture: self.architecture.clone(),
            weights: self.weights.clone(),
            vocabulary: self.vocabulary.clone(),
            max_length: self.max_length,
            ..ModelConfig::default()
        }
    }
}

const FILTERS: usize = 4;
const KERNEL: usize = 3;

/// Deterministic small weights in [-0.5, 0.5].
fn weights(n: usize, salt: usize) -> Vec<f32> {
    (0..n).map(|i| ((i * 7 + salt * 3) % 11) as f32 / 10.0 - 0.5).collect()
}

/// Write conv1d -> global max pool -> dense(sigmoid) over the tiny
/// vocabulary, with a pickled vocabulary table.
pub fn write_tiny_model(max_length: usize) -> anyhow::Result<TinyModel> {
    let dir = tempfile::tempdir()?;
    let vocab_size = TINY_TOKENS.chars().count();

    let architecture = dir.path().join("architecture.json");
    let arch = serde_json::json!({
        "input_shape": [max_length, vocab_size],
        "layers": [
            {"type": "conv1d", "name": "conv", "filters": FILTERS, "kernel_size": KERNEL,
             "padding": "same", "activation": "relu"},
            {"type": "global_max_pooling1d"},
            {"type": "dropout", "rate": 0.2},
            {"type": "dense", "name": "out", "units": 1, "activation": "sigmoid"}
        ]
    });
    std::fs::write(&architecture, serde_json::to_vec_pretty(&arch)?)?;

    let device = Device::Cpu;
    let mut tensors = HashMap::new();
    tensors.insert(
        "conv.weight".to_string(),
        Tensor::from_vec(weights(FILTERS * vocab_size * KERNEL, 1), (FILTERS, vocab_size, KERNEL), &device)?,
    );
    tensors.insert("conv.bias".to_string(), Tensor::from_vec(weights(FILTERS, 2), FILTERS, &device)?);
    tensors.insert("out.weight".to_string(), Tensor::from_vec(weights(FILTERS, 3), (1, FILTERS), &device)?);
    tensors.insert("out.bias".to_string(), Tensor::from_vec(vec![0.1f32], 1, &device)?);
    let weights_path = dir.path().join("model.safetensors");
    candle_core::safetensors::save(&tensors, &weights_path)?;

    let vocabulary = dir.path().join("tokenizer.pkl");
    let table: HashMap<String, i64> = TINY_TOKENS
        .chars()
        .enumerate()
        .map(|(i, c)| (c.to_string(), i as i64))
        .collect();
    std::fs::write(&vocabulary, serde_pickle::to_vec(&table, serde_pickle::SerOptions::new())?)?;

    Ok(TinyModel {
        dir,
        architecture,
        weights: weights_path,
        vocabulary,
        max_length,
    })
}
