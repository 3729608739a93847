//! Error types for vocabulary loading and inference.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model expects input of shape {expected:?} but the encoder produces {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model produced an empty output")]
    EmptyOutput,

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<candle_core::Error> for ModelError {
    fn from(e: candle_core::Error) -> Self {
        ModelError::Inference(e.to_string())
    }
}

impl From<serde_pickle::Error> for ModelError {
    fn from(e: serde_pickle::Error) -> Self {
        ModelError::Vocabulary(e.to_string())
    }
}
