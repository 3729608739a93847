//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use druglens_chem::{EmbedOptions, RenderOptions, StructureRenderer};
use druglens_common::{DruglensError, Result};
use druglens_config::Config;
use druglens_model::{load_scorer, EncodedInput, OneHotEncoder, Scorer, Vocabulary};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::templates::Templates;

/// Everything a request needs, built once at start-up and read-only
/// afterwards.
pub struct AppContext {
    pub encoder: OneHotEncoder,
    pub scorer: Arc<dyn Scorer>,
    pub renderer: StructureRenderer,
    pub templates: Templates,
    pub threshold: f32,
    /// `None` leaves inference unbounded.
    pub inference_timeout: Option<Duration>,
    /// Reported by `/health`.
    pub model_name: String,
    pub static_dir: PathBuf,
}

pub type SharedState = Arc<AppContext>;

impl AppContext {
    /// Load the vocabulary, the model and the templates named by `config`.
    pub fn initialize(config: &Config) -> Result<Self> {
        let model = &config.model;
        let vocabulary = Vocabulary::load(&model.vocabulary)
            .map_err(|e| DruglensError::Model(format!("{}: {e}", model.vocabulary.display())))?;
        info!("Vocabulary loaded: {} tokens", vocabulary.len());

        let encoder = OneHotEncoder::new(vocabulary, model.max_length);
        let scorer = load_scorer(model, (encoder.max_length(), encoder.vocab_size()))
            .map_err(|e| DruglensError::Model(e.to_string()))?;

        let templates = match &config.server.templates_dir {
            Some(dir) => Templates::from_dir(dir),
            None => Templates::embedded().map_err(|e| DruglensError::Template(e.to_string()))?,
        };

        let renderer = StructureRenderer::new(RenderOptions {
            image_size: config.render.image_size,
            embed: EmbedOptions {
                seed: config.render.embed_seed,
                iterations: config.render.embed_iterations,
            },
        });

        Ok(Self {
            encoder,
            scorer,
            renderer,
            templates,
            threshold: model.threshold,
            inference_timeout: model.inference_timeout_secs.map(Duration::from_secs),
            model_name: model.format.as_str().to_string(),
            static_dir: config.server.static_dir.clone(),
        })
    }

    /// Context around an already loaded scorer, with built-in templates
    /// and default rendering.
    pub fn with_scorer(encoder: OneHotEncoder, scorer: Arc<dyn Scorer>) -> Result<Self> {
        let config = Config::default();
        Ok(Self {
            encoder,
            model_name: scorer.describe(),
            scorer,
            renderer: StructureRenderer::default(),
            templates: Templates::embedded().map_err(|e| DruglensError::Template(e.to_string()))?,
            threshold: config.model.threshold,
            inference_timeout: None,
            static_dir: config.server.static_dir,
        })
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = Some(timeout);
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Run the model on a blocking worker thread.
    pub async fn score(&self, input: EncodedInput) -> std::result::Result<f32, ApiError> {
        let scorer = Arc::clone(&self.scorer);
        let start = Instant::now();
        let task = tokio::task::spawn_blocking(move || scorer.score(&input));

        let score = match self.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ApiError::Timeout)???,
            None => task.await??,
        };
        debug!("Inference took {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);
        Ok(score)
    }
}
