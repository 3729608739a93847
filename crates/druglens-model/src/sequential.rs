//! Sequential networks described by a JSON architecture file and a
//! safetensors weight file.
//!
//! The architecture mirrors a Keras `Sequential` model working on
//! channels-last `(batch, steps, features)` tensors:
//!
//! ```json
//! {
//!   "input_shape": [71, 35],
//!   "layers": [
//!     {"type": "conv1d", "name": "conv1", "filters": 64, "kernel_size": 5, "padding": "same", "activation": "relu"},
//!     {"type": "global_max_pooling1d"},
//!     {"type": "dropout", "rate": 0.3},
//!     {"type": "dense", "name": "out", "units": 1, "activation": "sigmoid"}
//!   ]
//! }
//! ```
//!
//! Weights are looked up under each layer's `name`: `<name>.weight` and
//! `<name>.bias` in candle layout (dense `(units, in)`, conv1d
//! `(filters, in, kernel)`), LSTM layers use candle's `weight_ih_l0`,
//! `weight_hh_l0`, `bias_ih_l0` and `bias_hh_l0`.

use std::path::Path;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::rnn::{LSTMConfig, LSTM, RNN};
use candle_nn::{Conv1d, Conv1dConfig, Linear, VarBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{first_element, Scorer};
use crate::encoder::EncodedInput;
use crate::pooling::{max_pool_1d, softmax, GlobalPooling};
use crate::{ModelError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    fn apply(&self, x: Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Linear => Ok(x),
            Activation::Relu => x.relu(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(&x),
            Activation::Tanh => x.tanh(),
            Activation::Softmax => softmax(&x),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    #[default]
    Valid,
    Same,
}

/// One entry of the `layers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        name: String,
        units: usize,
        #[serde(default)]
        activation: Activation,
    },
    Conv1d {
        name: String,
        filters: usize,
        kernel_size: usize,
        #[serde(default)]
        padding: Padding,
        #[serde(default)]
        activation: Activation,
    },
    MaxPooling1d {
        #[serde(default = "default_pool_size")]
        pool_size: usize,
        #[serde(default)]
        strides: Option<usize>,
    },
    GlobalMaxPooling1d,
    GlobalAveragePooling1d,
    Flatten,
    Dropout {
        #[serde(default)]
        rate: f32,
    },
    Lstm {
        name: String,
        units: usize,
        #[serde(default)]
        return_sequences: bool,
    },
}

fn default_pool_size() -> usize { 2 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// `(steps, features)` of one sample, batch axis excluded.
    pub input_shape: (usize, usize),
    pub layers: Vec<LayerSpec>,
}

impl Architecture {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Per-sample activation shape while building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Sequence { steps: usize, features: usize },
    Flat(usize),
}

enum Layer {
    Dense(Linear, Activation),
    Conv1d {
        conv: Conv1d,
        pad: (usize, usize),
        activation: Activation,
    },
    MaxPool { size: usize, stride: usize },
    Global(GlobalPooling),
    Flatten,
    Lstm { lstm: LSTM, return_sequences: bool },
}

impl Layer {
    fn forward(&self, x: Tensor) -> candle_core::Result<Tensor> {
        match self {
            Layer::Dense(linear, activation) => activation.apply(linear.forward(&x)?),
            Layer::Conv1d { conv, pad, activation } => {
                // candle convolves channels-first
                let mut x = x.transpose(1, 2)?.contiguous()?;
                if pad.0 + pad.1 > 0 {
                    x = x.pad_with_zeros(2, pad.0, pad.1)?;
                }
                let y = conv.forward(&x)?.transpose(1, 2)?.contiguous()?;
                activation.apply(y)
            }
            Layer::MaxPool { size, stride } => max_pool_1d(&x, *size, *stride),
            Layer::Global(pooling) => pooling.apply(&x),
            Layer::Flatten => x.flatten_from(1),
            Layer::Lstm { lstm, return_sequences } => {
                let states = lstm.seq(&x)?;
                if *return_sequences {
                    lstm.states_to_tensor(&states)
                } else {
                    match states.last() {
                        Some(state) => Ok(state.h().clone()),
                        None => candle_core::bail!("LSTM received an empty sequence"),
                    }
                }
            }
        }
    }
}

fn load_err(e: candle_core::Error) -> ModelError {
    ModelError::ModelLoad(e.to_string())
}

fn build_layer(spec: &LayerSpec, shape: Shape, vb: &VarBuilder) -> Result<(Option<Layer>, Shape)> {
    let sequence = |what: &str| match shape {
        Shape::Sequence { steps, features } => Ok((steps, features)),
        Shape::Flat(_) => Err(ModelError::ModelLoad(format!("{what} needs a sequence input"))),
    };

    let built = match spec {
        LayerSpec::Dense { name, units, activation } => {
            let (input, out_shape) = match shape {
                Shape::Sequence { steps, features } => (features, Shape::Sequence { steps, features: *units }),
                Shape::Flat(n) => (n, Shape::Flat(*units)),
            };
            let linear = candle_nn::linear(input, *units, vb.pp(name)).map_err(load_err)?;
            (Some(Layer::Dense(linear, *activation)), out_shape)
        }
        LayerSpec::Conv1d { name, filters, kernel_size, padding, activation } => {
            let (steps, features) = sequence("conv1d")?;
            let pad = match padding {
                Padding::Valid => (0, 0),
                Padding::Same => {
                    let total = kernel_size.saturating_sub(1);
                    (total / 2, total - total / 2)
                }
            };
            let padded = steps + pad.0 + pad.1;
            if padded < *kernel_size {
                return Err(ModelError::ModelLoad(format!(
                    "conv1d '{name}' kernel {kernel_size} is longer than its input ({steps})"
                )));
            }
            let conv = candle_nn::conv1d(features, *filters, *kernel_size, Conv1dConfig::default(), vb.pp(name))
                .map_err(load_err)?;
            let layer = Layer::Conv1d { conv, pad, activation: *activation };
            (Some(layer), Shape::Sequence { steps: padded - kernel_size + 1, features: *filters })
        }
        LayerSpec::MaxPooling1d { pool_size, strides } => {
            let (steps, features) = sequence("max_pooling1d")?;
            let stride = strides.unwrap_or(*pool_size);
            if *pool_size == 0 || stride == 0 || steps < *pool_size {
                return Err(ModelError::ModelLoad(format!(
                    "max_pooling1d of size {pool_size} cannot pool {steps} steps"
                )));
            }
            let layer = Layer::MaxPool { size: *pool_size, stride };
            (Some(layer), Shape::Sequence { steps: (steps - pool_size) / stride + 1, features })
        }
        LayerSpec::GlobalMaxPooling1d => {
            let (_, features) = sequence("global_max_pooling1d")?;
            (Some(Layer::Global(GlobalPooling::Max)), Shape::Flat(features))
        }
        LayerSpec::GlobalAveragePooling1d => {
            let (_, features) = sequence("global_average_pooling1d")?;
            (Some(Layer::Global(GlobalPooling::Mean)), Shape::Flat(features))
        }
        LayerSpec::Flatten => match shape {
            Shape::Sequence { steps, features } => (Some(Layer::Flatten), Shape::Flat(steps * features)),
            Shape::Flat(_) => (None, shape),
        },
        // identity at inference
        LayerSpec::Dropout { .. } => (None, shape),
        LayerSpec::Lstm { name, units, return_sequences } => {
            let (steps, features) = sequence("lstm")?;
            let lstm = candle_nn::lstm(features, *units, LSTMConfig::default(), vb.pp(name)).map_err(load_err)?;
            let out_shape = if *return_sequences {
                Shape::Sequence { steps, features: *units }
            } else {
                Shape::Flat(*units)
            };
            (Some(Layer::Lstm { lstm, return_sequences: *return_sequences }), out_shape)
        }
    };
    Ok(built)
}

/// Feed-forward classifier built from an [`Architecture`].
pub struct SequentialClassifier {
    layers: Vec<Layer>,
    device: Device,
    input_shape: (usize, usize),
    summary: String,
}

impl SequentialClassifier {
    /// Load architecture and weights from disk.
    ///
    /// `expected_input` is `(max_length, vocab_size)` of the encoder; a
    /// model declaring a different input shape is rejected.
    pub fn load(architecture: &Path, weights: &Path, expected_input: (usize, usize), device: Device) -> Result<Self> {
        let arch = Architecture::from_file(architecture)?;
        if !weights.exists() {
            return Err(ModelError::ModelLoad(format!("weights not found: {}", weights.display())));
        }
        debug!("Reading weights from {}", weights.display());
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device).map_err(load_err)? };
        Self::from_var_builder(&arch, vb, expected_input, device)
    }

    pub fn from_var_builder(
        arch: &Architecture,
        vb: VarBuilder,
        expected_input: (usize, usize),
        device: Device,
    ) -> Result<Self> {
        if arch.input_shape != expected_input {
            return Err(ModelError::ShapeMismatch {
                expected: arch.input_shape,
                actual: expected_input,
            });
        }

        let mut shape = Shape::Sequence {
            steps: arch.input_shape.0,
            features: arch.input_shape.1,
        };
        let mut layers = Vec::with_capacity(arch.layers.len());
        for spec in &arch.layers {
            let (layer, next) = build_layer(spec, shape, &vb)?;
            layers.extend(layer);
            shape = next;
        }
        if let Shape::Sequence { .. } = shape {
            debug!("Model output is a sequence; the score is its first element");
        }

        let summary = format!(
            "sequential model with {} layers, input {:?}, {:?}",
            arch.layers.len(),
            arch.input_shape,
            device
        );
        Ok(Self {
            layers,
            device,
            input_shape: arch.input_shape,
            summary,
        })
    }

    pub fn input_shape(&self) -> (usize, usize) {
        self.input_shape
    }

    /// Raw model output for one input.
    pub fn forward(&self, input: &EncodedInput) -> Result<Tensor> {
        let (_, steps, features) = input.shape();
        if (steps, features) != self.input_shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_shape,
                actual: (steps, features),
            });
        }
        let mut x = input.to_tensor(&self.device)?;
        for layer in &self.layers {
            x = layer.forward(x)?;
        }
        Ok(x)
    }
}

impl Scorer for SequentialClassifier {
    fn score(&self, input: &EncodedInput) -> Result<f32> {
        first_element(&self.forward(input)?)
    }

    fn describe(&self) -> String {
        self.summary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::encoder::OneHotEncoder;
    use crate::vocabulary::Vocabulary;

    fn encoder(max_length: usize) -> OneHotEncoder {
        let vocab = Vocabulary::from_entries([("C", 0), ("O", 1), ("=", 2)]).unwrap();
        OneHotEncoder::new(vocab, max_length)
    }

    fn var_builder(tensors: Vec<(&str, Tensor)>) -> VarBuilder<'static> {
        let map: HashMap<String, Tensor> = tensors.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        VarBuilder::from_tensors(map, DType::F32, &Device::Cpu)
    }

    fn t(data: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_slice(data, shape, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_parse_architecture() {
        let json = r#"{
            "input_shape": [4, 3],
            "layers": [
                {"type": "conv1d", "name": "c", "filters": 2, "kernel_size": 2, "padding": "same", "activation": "relu"},
                {"type": "max_pooling1d"},
                {"type": "flatten"},
                {"type": "dropout", "rate": 0.5},
                {"type": "dense", "name": "d", "units": 1, "activation": "sigmoid"}
            ]
        }"#;
        let arch: Architecture = serde_json::from_str(json).unwrap();
        assert_eq!(arch.input_shape, (4, 3));
        assert_eq!(arch.layers[1], LayerSpec::MaxPooling1d { pool_size: 2, strides: None });
        assert_eq!(arch.layers[3], LayerSpec::Dropout { rate: 0.5 });
    }

    #[test]
    fn test_dense_on_flattened_input() {
        // weight picks out "first character is O"
        let mut weight = vec![0.0f32; 6];
        weight[1] = 4.0;
        let vb = var_builder(vec![("out.weight", t(&weight, &[1, 6])), ("out.bias", t(&[-2.0], &[1]))]);
        let arch = Architecture {
            input_shape: (2, 3),
            layers: vec![
                LayerSpec::Flatten,
                LayerSpec::Dense { name: "out".into(), units: 1, activation: Activation::Sigmoid },
            ],
        };
        let model = SequentialClassifier::from_var_builder(&arch, vb, (2, 3), Device::Cpu).unwrap();
        let enc = encoder(2);

        let high = model.score(&enc.encode("OC")).unwrap();
        let low = model.score(&enc.encode("CO")).unwrap();
        assert!((high - 1.0 / (1.0 + (-2.0f32).exp())).abs() < 1e-5);
        assert!((low - 1.0 / (1.0 + 2.0f32.exp())).abs() < 1e-5);
    }

    #[test]
    fn test_conv_same_padding_keeps_length() {
        // a single filter of width 3 that counts '=' in the window
        let mut weight = vec![0.0f32; 9];
        for k in 0..3 {
            weight[2 * 3 + k] = 1.0;
        }
        let vb = var_builder(vec![
            ("conv.weight", t(&weight, &[1, 3, 3])),
            ("conv.bias", t(&[0.0], &[1])),
        ]);
        let arch = Architecture {
            input_shape: (5, 3),
            layers: vec![LayerSpec::Conv1d {
                name: "conv".into(),
                filters: 1,
                kernel_size: 3,
                padding: Padding::Same,
                activation: Activation::Linear,
            }],
        };
        let model = SequentialClassifier::from_var_builder(&arch, vb, (5, 3), Device::Cpu).unwrap();
        let out = model.forward(&encoder(5).encode("C=O=C")).unwrap();
        assert_eq!(out.dims(), &[1, 5, 1]);
        let values: Vec<f32> = out.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(values, vec![1.0, 1.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_lstm_then_dense() {
        let hidden = 2;
        let vb = var_builder(vec![
            ("rnn.weight_ih_l0", t(&vec![0.1; 4 * hidden * 3], &[4 * hidden, 3])),
            ("rnn.weight_hh_l0", t(&vec![0.1; 4 * hidden * hidden], &[4 * hidden, hidden])),
            ("rnn.bias_ih_l0", t(&vec![0.0; 4 * hidden], &[4 * hidden])),
            ("rnn.bias_hh_l0", t(&vec![0.0; 4 * hidden], &[4 * hidden])),
            ("out.weight", t(&[1.0, 1.0], &[1, hidden])),
            ("out.bias", t(&[0.0], &[1])),
        ]);
        let arch = Architecture {
            input_shape: (4, 3),
            layers: vec![
                LayerSpec::Lstm { name: "rnn".into(), units: hidden, return_sequences: false },
                LayerSpec::Dense { name: "out".into(), units: 1, activation: Activation::Sigmoid },
            ],
        };
        let model = SequentialClassifier::from_var_builder(&arch, vb, (4, 3), Device::Cpu).unwrap();
        let score = model.score(&encoder(4).encode("CC=O")).unwrap();
        assert!(score > 0.5 && score < 1.0);
        assert_eq!(score, model.score(&encoder(4).encode("CC=O")).unwrap());
    }

    #[test]
    fn test_input_shape_mismatch() {
        let arch = Architecture {
            input_shape: (71, 30),
            layers: vec![LayerSpec::GlobalMaxPooling1d],
        };
        let vb = var_builder(vec![]);
        let err = SequentialClassifier::from_var_builder(&arch, vb, (71, 3), Device::Cpu).err();
        assert!(matches!(
            err,
            Some(ModelError::ShapeMismatch { expected: (71, 30), actual: (71, 3) })
        ));
    }

    #[test]
    fn test_missing_weights_fail_at_load() {
        let arch = Architecture {
            input_shape: (2, 3),
            layers: vec![LayerSpec::Dense { name: "missing".into(), units: 1, activation: Activation::Linear }],
        };
        let vb = var_builder(vec![]);
        let err = SequentialClassifier::from_var_builder(&arch, vb, (2, 3), Device::Cpu).err();
        assert!(matches!(err, Some(ModelError::ModelLoad(_))));
    }
}
