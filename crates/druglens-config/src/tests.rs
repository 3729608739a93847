#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_training_setup() {
        let config = Config::default();
        assert_eq!(config.model.max_length, 71);
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.model.format, ModelFormat::Sequential);
        assert_eq!(config.render.image_size, 300);
        assert!(config.model.inference_timeout_secs.is_none());
        assert_eq!(config.server.static_dir, PathBuf::from("crates/druglens-web/static"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [model]
            format = "onnx"
            weights = "models/model.onnx"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.model.format, ModelFormat::Onnx);
        assert_eq!(config.model.weights, PathBuf::from("models/model.onnx"));
        assert_eq!(config.model.max_length, 71);
        assert_eq!(config.render.embed_seed, default_embed_seed());
    }

    #[test]
    fn test_yaml_and_json_are_accepted() {
        let yaml = Config::from_yaml("model:\n  max_length: 100\n").unwrap();
        assert_eq!(yaml.model.max_length, 100);

        let json = Config::from_json(r#"{"render": {"image_size": 512}}"#).unwrap();
        assert_eq!(json.render.image_size, 512);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.model.threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.model.max_length = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.render.image_size = 8;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("druglens.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "server:\n  port: 9000\nmodel:\n  use_gpu: true").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.model.use_gpu);
        assert_eq!(config.server.socket_addr().port(), 9000);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = Config::load_from("/definitely/not/here/druglens.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../druglens.example.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.render.embed_seed, 0xF00D);
        assert_eq!(config.model.inference_timeout_secs, None);
    }
}
