//! Loading a model, its vocabulary and architecture from files on disk.
//!
//! Runs against the tiny conv1d network written by druglens-test-utils.

use druglens_config::ModelFormat;
use druglens_model::{load_scorer, ModelError, OneHotEncoder, Vocabulary};
use druglens_test_utils::{tiny_vocabulary, write_tiny_model, TINY_TOKENS};
use pretty_assertions::assert_eq;

#[test]
fn test_pickled_vocabulary_matches_table() {
    let model = write_tiny_model(16).unwrap();
    let vocabulary = Vocabulary::load(&model.vocabulary).unwrap();
    assert_eq!(vocabulary.len(), TINY_TOKENS.chars().count());
    assert_eq!(vocabulary.tokens(), tiny_vocabulary().tokens());
    assert_eq!(vocabulary.get('C'), Some(0));
}

#[test]
fn test_sequential_model_scores_in_unit_interval() {
    let model = write_tiny_model(16).unwrap();
    let vocabulary = Vocabulary::load(&model.vocabulary).unwrap();
    let encoder = OneHotEncoder::new(vocabulary, model.max_length);
    let scorer = load_scorer(
        &model.model_config(),
        (encoder.max_length(), encoder.vocab_size()),
    )
    .unwrap();

    for smiles in ["CCO", "c1ccccc1", "CC(=O)Nc1ccc(O)cc1", ""] {
        let score = scorer.score(&encoder.encode(smiles)).unwrap();
        assert!((0.0..=1.0).contains(&score), "{smiles}: {score}");
    }
}

#[test]
fn test_scores_are_repeatable() {
    let model = write_tiny_model(16).unwrap();
    let encoder = OneHotEncoder::new(Vocabulary::load(&model.vocabulary).unwrap(), 16);
    let scorer = load_scorer(&model.model_config(), (16, encoder.vocab_size())).unwrap();

    let input = encoder.encode("CCN(CC)CC");
    let first = scorer.score(&input).unwrap();
    let second = scorer.score(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_max_length_disagreeing_with_architecture_fails_at_load() {
    let model = write_tiny_model(16).unwrap();
    let config = model.model_config();
    let err = load_scorer(&config, (32, TINY_TOKENS.chars().count()))
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }), "{err}");
}

#[test]
fn test_missing_weights_file() {
    let model = write_tiny_model(16).unwrap();
    let mut config = model.model_config();
    config.weights = model.dir.path().join("absent.safetensors");
    assert!(load_scorer(&config, (16, TINY_TOKENS.chars().count())).is_err());
}

#[test]
fn test_missing_architecture_file() {
    let model = write_tiny_model(16).unwrap();
    let mut config = model.model_config();
    config.architecture = model.dir.path().join("absent.json");
    assert_eq!(config.format, ModelFormat::Sequential);
    assert!(load_scorer(&config, (16, TINY_TOKENS.chars().count())).is_err());
}
