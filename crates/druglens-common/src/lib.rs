//! druglens-common: Shared prediction types and errors used across all druglens crates.

pub mod error;
pub mod prediction;

// Re-export commonly used types
pub use error::{DruglensError, Result};
pub use prediction::{DrugLikeness, PredictionResult, DEFAULT_THRESHOLD};
