//! Inference adapter: a preloaded model that maps one encoded SMILES to a
//! single score.

use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use druglens_config::{ModelConfig, ModelFormat};
use tracing::{debug, info};

use crate::encoder::EncodedInput;
use crate::sequential::SequentialClassifier;
use crate::{ModelError, Result};

/// A loaded model that scores one encoded input.
///
/// Implementations are read-only after loading and shared across
/// request threads.
pub trait Scorer: Send + Sync {
    /// First element of the model's flattened output.
    fn score(&self, input: &EncodedInput) -> Result<f32>;

    /// Short description for logs and the health endpoint.
    fn describe(&self) -> String;
}

/// Select the best available device.
pub fn select_device(use_gpu: bool) -> Result<Device> {
    if !use_gpu {
        return Ok(Device::Cpu);
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("CUDA device available");
                return Ok(device);
            }
            Err(e) => {
                debug!("CUDA not available: {}, falling back to CPU", e);
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Metal device available");
                return Ok(device);
            }
            Err(e) => {
                debug!("Metal not available: {}, falling back to CPU", e);
            }
        }
    }

    debug!("GPU requested but no GPU feature is usable, using CPU");
    Ok(Device::Cpu)
}

/// First element of a model output of any shape.
pub(crate) fn first_element(output: &Tensor) -> Result<f32> {
    let values = output.flatten_all()?.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    values.first().copied().ok_or(ModelError::EmptyOutput)
}

/// Load the model described by `config`.
///
/// `input_shape` is `(max_length, vocab_size)` of the encoder the model
/// will be fed by.
pub fn load_scorer(config: &ModelConfig, input_shape: (usize, usize)) -> Result<Arc<dyn Scorer>> {
    let start = Instant::now();
    info!("Loading {} model", config.format.as_str());

    let scorer: Arc<dyn Scorer> = match config.format {
        ModelFormat::Sequential => {
            let device = select_device(config.use_gpu)?;
            Arc::new(SequentialClassifier::load(
                &config.architecture,
                &config.weights,
                input_shape,
                device,
            )?)
        }
        ModelFormat::Onnx => load_onnx(config, input_shape)?,
    };

    info!(
        "Model loaded in {:.2}s: {}",
        start.elapsed().as_secs_f32(),
        scorer.describe()
    );
    Ok(scorer)
}

#[cfg(feature = "onnx")]
fn load_onnx(config: &ModelConfig, input_shape: (usize, usize)) -> Result<Arc<dyn Scorer>> {
    let model = crate::onnx::OnnxClassifier::load(&config.weights, input_shape)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_config: &ModelConfig, _input_shape: (usize, usize)) -> Result<Arc<dyn Scorer>> {
    Err(ModelError::UnsupportedFormat(
        "onnx models need druglens-model built with the `onnx` feature".into(),
    ))
}
