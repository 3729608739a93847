use druglens_config::ConfigError;
use thiserror::Error;

/// Start-up and wiring failures that abort the process.
///
/// Per-request failures never end up here; they are mapped to HTTP
/// responses by the web crate.
#[derive(Debug, Error)]
pub enum DruglensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Template error: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, DruglensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stage() {
        let err: DruglensError = ConfigError::Invalid("model.max_length must be positive".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration: model.max_length must be positive"
        );
        assert_eq!(DruglensError::Model("missing".into()).to_string(), "Model error: missing");
        assert_eq!(DruglensError::Template("bad".into()).to_string(), "Template error: bad");
    }
}
