//! Pooling over the sequence axis of `(batch, seq_len, channels)` tensors.

use candle_core::{Tensor, D};
use serde::{Deserialize, Serialize};

/// Global pooling that collapses the sequence axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalPooling {
    /// Average over all positions
    Mean,

    /// Maximum over all positions
    Max,
}

impl GlobalPooling {
    /// Apply pooling to a sequence of feature vectors.
    ///
    /// # Arguments
    /// * `sequence` - Tensor of shape (batch_size, seq_len, channels)
    ///
    /// # Returns
    /// Tensor of shape (batch_size, channels)
    pub fn apply(&self, sequence: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            GlobalPooling::Mean => sequence.mean(1),
            GlobalPooling::Max => sequence.max(1),
        }
    }
}

/// Windowed max pooling along the sequence axis with `valid` padding.
///
/// Input (batch, seq_len, channels), output
/// (batch, (seq_len - size) / stride + 1, channels).
pub fn max_pool_1d(sequence: &Tensor, size: usize, stride: usize) -> candle_core::Result<Tensor> {
    // max_pool2d works on (batch, channels, height, width)
    sequence
        .transpose(1, 2)?
        .unsqueeze(2)?
        .contiguous()?
        .max_pool2d_with_stride((1, size), (1, stride))?
        .squeeze(2)?
        .transpose(1, 2)?
        .contiguous()
}

/// Row-wise softmax over the last dimension.
pub fn softmax(x: &Tensor) -> candle_core::Result<Tensor> {
    candle_nn::ops::softmax(x, D::Minus1)
}
