//! Character vocabulary used by the one-hot encoder.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_pickle::DeOptions;
use tracing::info;

use crate::{ModelError, Result};

/// Immutable mapping from a single character to its one-hot column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    index: HashMap<char, usize>,
}

impl Vocabulary {
    /// Build from raw `(token, index)` pairs.
    ///
    /// Every token must be exactly one character and the indices must be
    /// distinct and below the number of entries.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let entries: Vec<(S, i64)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(ModelError::Vocabulary("vocabulary is empty".into()));
        }
        let size = entries.len();
        let mut index = HashMap::with_capacity(size);
        let mut taken = vec![false; size];

        for (token, idx) in &entries {
            let token = token.as_ref();
            let mut chars = token.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => {
                    return Err(ModelError::Vocabulary(format!(
                        "token {token:?} is not a single character"
                    )))
                }
            };
            let slot = usize::try_from(*idx)
                .ok()
                .filter(|&i| i < size)
                .ok_or_else(|| {
                    ModelError::Vocabulary(format!("index {idx} of {token:?} is outside 0..{size}"))
                })?;
            if taken[slot] {
                return Err(ModelError::Vocabulary(format!("index {slot} is used twice")));
            }
            taken[slot] = true;
            if index.insert(ch, slot).is_some() {
                return Err(ModelError::Vocabulary(format!("token {token:?} appears twice")));
            }
        }
        Ok(Self { index })
    }

    /// Load a pickled dict (`.pkl`, `.pickle`, `.joblib`) or a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let vocab = match ext.as_deref() {
            Some("pkl" | "pickle" | "joblib") => Self::from_pickle(&bytes)?,
            Some("json") => Self::from_json(&bytes)?,
            other => {
                return Err(ModelError::Vocabulary(format!(
                    "unknown vocabulary file type {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                )))
            }
        };
        info!("Loaded vocabulary with {} tokens from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    pub fn from_pickle(bytes: &[u8]) -> Result<Self> {
        let map: HashMap<String, i64> = serde_pickle::from_slice(bytes, DeOptions::new())?;
        Self::from_entries(map)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let map: HashMap<String, i64> = serde_json::from_slice(bytes)?;
        Self::from_entries(map)
    }

    pub fn get(&self, ch: char) -> Option<usize> {
        self.index.get(&ch).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Tokens ordered by their index.
    pub fn tokens(&self) -> Vec<char> {
        let ordered: BTreeMap<usize, char> = self.index.iter().map(|(c, i)| (*i, *c)).collect();
        ordered.into_values().collect()
    }
}
