//! Configuration loading for druglens.
//! Reads druglens.toml from the current directory or the path in the DRUGLENS_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

mod tests;

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV: &str = "DRUGLENS_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "druglens.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Directory with `index.html` / `visualize.html` overriding the built-in templates.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn default_host()       -> IpAddr  { IpAddr::from([127, 0, 0, 1]) }
fn default_port()       -> u16     { 5000 }
/// Relative to the workspace root, where `cargo run -p druglens-web` starts.
fn default_static_dir() -> PathBuf { PathBuf::from("crates/druglens-web/static") }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            templates_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// On-disk format of the trained classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Layer list in JSON plus a safetensors weight file.
    #[default]
    Sequential,
    /// Single ONNX graph (requires the `onnx` feature of druglens-model).
    Onnx,
}

impl ModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Sequential => "sequential",
            ModelFormat::Onnx => "onnx",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub format: ModelFormat,
    /// Layer description, only read for the sequential format.
    #[serde(default = "default_architecture")]
    pub architecture: PathBuf,
    /// Safetensors file (sequential) or `.onnx` graph.
    #[serde(default = "default_weights")]
    pub weights: PathBuf,
    /// Character → index table (`.pkl` or `.json`).
    #[serde(default = "default_vocabulary")]
    pub vocabulary: PathBuf,
    /// Must match the sequence length the model was trained with.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default)]
    pub use_gpu: bool,
    /// Unset keeps inference unbounded.
    #[serde(default)]
    pub inference_timeout_secs: Option<u64>,
}

fn default_architecture() -> PathBuf { PathBuf::from("models/architecture.json") }
fn default_weights()      -> PathBuf { PathBuf::from("models/best_model.safetensors") }
fn default_vocabulary()   -> PathBuf { PathBuf::from("models/tokenizer.pkl") }
fn default_max_length()   -> usize   { 71 }
fn default_threshold()    -> f32     { 0.5 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            format: ModelFormat::default(),
            architecture: default_architecture(),
            weights: default_weights(),
            vocabulary: default_vocabulary(),
            max_length: default_max_length(),
            threshold: default_threshold(),
            use_gpu: false,
            inference_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Edge length of the square 2D depiction, in pixels.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    #[serde(default = "default_embed_seed")]
    pub embed_seed: u64,
    #[serde(default = "default_embed_iterations")]
    pub embed_iterations: usize,
}

fn default_image_size()       -> u32   { 300 }
fn default_embed_seed()       -> u64   { 0xF00D }
fn default_embed_iterations() -> usize { 300 }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            embed_seed: default_embed_seed(),
            embed_iterations: default_embed_iterations(),
        }
    }
}

impl Config {
    /// Load configuration.
    /// Checks DRUGLENS_CONFIG first, then druglens.toml in the current directory.
    /// Falls back to defaults only when no explicit path was given.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from(path),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    let config = Config::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Load and validate a config file; the format follows the extension.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        debug!("Loaded config from {}", path.display());

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.model.max_length == 0 {
            return Err(ConfigError::Invalid("model.max_length must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.model.threshold) {
            return Err(ConfigError::Invalid(format!(
                "model.threshold must lie in [0, 1], got {}",
                self.model.threshold
            )));
        }
        if self.model.inference_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("model.inference_timeout_secs must be positive".into()));
        }
        if self.render.image_size < 32 {
            return Err(ConfigError::Invalid(format!(
                "render.image_size must be at least 32 px, got {}",
                self.render.image_size
            )));
        }
        if self.render.embed_iterations == 0 {
            return Err(ConfigError::Invalid("render.embed_iterations must be positive".into()));
        }
        Ok(())
    }
}
