//! DrugLens Model Service
//!
//! Pure Rust drug-likeness inference using Candle (Hugging Face).
//! No Python dependency - the network is rebuilt from a JSON architecture
//! description and a safetensors weight file.
//!
//! # Features
//! - One-hot SMILES encoding against a fixed character vocabulary
//! - Sequential dense / conv1d / pooling / LSTM networks
//! - Optional ONNX models (`onnx` feature)
//! - GPU support (CUDA, Metal) with fallback to CPU
//!
//! # Example
//! ```no_run
//! use std::path::Path;
//! use druglens_config::ModelConfig;
//! use druglens_model::{load_scorer, OneHotEncoder, Vocabulary};
//!
//! fn main() -> Result<(), druglens_model::ModelError> {
//!     let config = ModelConfig::default();
//!     let vocabulary = Vocabulary::load(Path::new("models/tokenizer.pkl"))?;
//!     let encoder = OneHotEncoder::new(vocabulary, config.max_length);
//!     let scorer = load_scorer(&config, (encoder.max_length(), encoder.vocab_size()))?;
//!
//!     let score = scorer.score(&encoder.encode("CC(=O)Oc1ccccc1C(=O)O"))?;
//!     println!("score: {score:.2}");
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod encoder;
pub mod error;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pooling;
pub mod sequential;
pub mod vocabulary;

pub use classifier::{load_scorer, select_device, Scorer};
pub use encoder::{EncodedInput, OneHotEncoder};
pub use error::{ModelError, Result};
pub use sequential::{Architecture, SequentialClassifier};
pub use vocabulary::Vocabulary;
