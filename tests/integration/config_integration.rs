//! Integration tests for the configuration layers

use cruciverb::config::{ConfigLoader, ProviderType};
use cruciverb::error::ApiError;
use cruciverb::generation::{GenerationStage, LlmCollaborator};
use cruciverb::service::ConstructionService;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Serializes tests that read or set CRUCIVERB__* variables
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn write_workspace_config(workspace: &Path, contents: &str) {
    let config_dir = workspace.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

const PROVIDERS: &str = r#"
[providers.local]
provider_type = "ollama"
model = "llama3"
endpoint = "http://localhost:11434"

[stages]
default = "local"
"#;

#[test]
fn test_workspace_file_overrides_defaults() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        r#"
[construction]
grid_rows = 5
grid_cols = 5
quality_threshold = 8.5

[pipeline]
workers = 4
"#,
    );

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    assert_eq!(config.construction.grid_rows, 5);
    assert_eq!(config.construction.quality_threshold, 8.5);
    // untouched keys keep their defaults
    assert_eq!(config.construction.max_retries, 3);
    assert_eq!(config.pipeline.workers, 4);
    assert!(config.validate().is_ok());
}

#[test]
fn test_global_file_sits_below_workspace_file() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    let global = temp_dir.path().join("global.toml");
    std::fs::write(
        &global,
        r#"
[construction]
max_retries = 6
min_word_length = 4
"#,
    )
    .unwrap();
    write_workspace_config(
        temp_dir.path(),
        r#"
[construction]
max_retries = 2
"#,
    );

    let config = ConfigLoader::load_with_global(temp_dir.path(), Some(global)).unwrap();
    assert_eq!(config.construction.max_retries, 2);
    assert_eq!(config.construction.min_word_length, 4);
}

#[test]
fn test_environment_overrides_files() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        r#"
[pipeline]
workers = 4
"#,
    );

    std::env::set_var("CRUCIVERB__PIPELINE__WORKERS", "7");
    let loaded = ConfigLoader::load_with_global(temp_dir.path(), None);
    std::env::remove_var("CRUCIVERB__PIPELINE__WORKERS");

    assert_eq!(loaded.unwrap().pipeline.workers, 7);
}

#[test]
fn test_invalid_values_are_reported_together() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        r#"
[construction]
max_retries = 0
quality_threshold = 12.0

[pipeline]
workers = 0
"#,
    );

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3, "{:?}", errors);

    let err = config.ensure_valid().unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(ref msg) if msg.contains("workers")));
}

#[test]
fn test_providers_and_stages_wire_a_collaborator() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(temp_dir.path(), PROVIDERS);

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.providers["local"].provider_type, ProviderType::Ollama);
    for stage in GenerationStage::ALL {
        assert_eq!(config.stages.provider_for(stage), Some("local"));
    }
    assert!(LlmCollaborator::from_config(&config).is_ok());
}

#[test]
fn test_missing_stage_provider_is_reported() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    let err = LlmCollaborator::from_config(&config).err().unwrap();
    assert!(matches!(err, ApiError::ProviderNotConfigured(_)));
}

#[test]
fn test_service_builds_from_config() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    let lexicon = temp_dir.path().join("words.txt");
    std::fs::write(&lexicon, "spa\ntin\nyet\n").unwrap();
    write_workspace_config(
        temp_dir.path(),
        &format!(
            "{}\n[lexicon]\npath = {:?}\n\n[pipeline]\narchive_path = {:?}\n",
            PROVIDERS,
            lexicon.display().to_string(),
            temp_dir.path().join("archive").display().to_string(),
        ),
    );

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    let collaborator = Arc::new(LlmCollaborator::from_config(&config).unwrap());
    let service = ConstructionService::from_config(&config, collaborator).unwrap();
    assert!(service.store().archive().is_some());
    assert!(!service.is_running());
}

#[test]
fn test_missing_lexicon_file_fails_service_setup() {
    let _guard = ENV_LOCK.lock();
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        &format!(
            "{}\n[lexicon]\npath = {:?}\n",
            PROVIDERS,
            temp_dir.path().join("absent.txt").display().to_string(),
        ),
    );

    let config = ConfigLoader::load_with_global(temp_dir.path(), None).unwrap();
    let collaborator = Arc::new(LlmCollaborator::from_config(&config).unwrap());
    assert!(ConstructionService::from_config(&config, collaborator).is_err());
}
