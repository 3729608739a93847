//! ONNX classifiers evaluated with `candle-onnx`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use candle_core::Device;
use candle_onnx::onnx::ModelProto;
use tracing::debug;

use crate::classifier::{first_element, Scorer};
use crate::encoder::EncodedInput;
use crate::{ModelError, Result};

pub struct OnnxClassifier {
    model: ModelProto,
    input_name: String,
    output_name: String,
    input_shape: (usize, usize),
}

impl OnnxClassifier {
    /// Read the graph and resolve its data input and first output.
    ///
    /// Graph inputs that are also initializers are weights, not data.
    pub fn load(path: &Path, input_shape: (usize, usize)) -> Result<Self> {
        let model = candle_onnx::read_file(path)
            .map_err(|e| ModelError::ModelLoad(format!("{}: {e}", path.display())))?;
        let graph = model
            .graph
            .as_ref()
            .ok_or_else(|| ModelError::ModelLoad("ONNX file has no graph".into()))?;

        let initializers: HashSet<&str> = graph.initializer.iter().map(|t| t.name.as_str()).collect();
        let input_name = graph
            .input
            .iter()
            .map(|i| i.name.as_str())
            .find(|name| !initializers.contains(name))
            .ok_or_else(|| ModelError::ModelLoad("ONNX graph has no data input".into()))?
            .to_string();
        let output_name = graph
            .output
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::ModelLoad("ONNX graph has no outputs".into()))?;
        debug!("ONNX input '{}' -> output '{}'", input_name, output_name);

        Ok(Self {
            model,
            input_name,
            output_name,
            input_shape,
        })
    }
}

impl Scorer for OnnxClassifier {
    fn score(&self, input: &EncodedInput) -> Result<f32> {
        let (_, steps, features) = input.shape();
        if (steps, features) != self.input_shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_shape,
                actual: (steps, features),
            });
        }
        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.clone(), input.to_tensor(&Device::Cpu)?);
        let mut outputs = candle_onnx::simple_eval(&self.model, inputs)?;
        let output = outputs.remove(&self.output_name).ok_or(ModelError::EmptyOutput)?;
        first_element(&output)
    }

    fn describe(&self) -> String {
        format!("onnx model, input '{}' {:?}", self.input_name, self.input_shape)
    }
}
