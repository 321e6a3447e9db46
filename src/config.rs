//! Configuration System
//!
//! Layered configuration: merge-policy defaults, the global user file, the
//! workspace `config/` directory and finally `CRUCIVERB__*` environment
//! variables. Validation collects every problem instead of stopping at the first.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType};

mod merge;
mod sources;

/// Per-job construction parameters. Each job runs against its own clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    pub min_word_length: usize,
    pub max_black_ratio: f64,
    pub max_black_block: usize,
    pub max_retries: u32,
    pub quality_threshold: f64,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub require_symmetry: bool,
    pub randomness: f64,
    pub randomness_step: f64,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            min_word_length: 3,
            max_black_ratio: 0.20,
            max_black_block: 2,
            max_retries: 3,
            quality_threshold: 7.0,
            grid_rows: 15,
            grid_cols: 15,
            require_symmetry: true,
            randomness: 0.7,
            randomness_step: 0.1,
            retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
        }
    }
}

impl ConstructionConfig {
    /// Every parameter problem, in field order
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.grid_rows == 0 || self.grid_cols == 0 {
            problems.push(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_rows, self.grid_cols
            ));
        }
        if self.min_word_length < 2 {
            problems.push(format!(
                "min_word_length must be at least 2, got {}",
                self.min_word_length
            ));
        }
        if !(self.max_black_ratio > 0.0 && self.max_black_ratio <= 1.0) {
            problems.push(format!(
                "max_black_ratio must be in (0, 1], got {}",
                self.max_black_ratio
            ));
        }
        if self.max_black_block < 2 {
            problems.push(format!(
                "max_black_block must be at least 2, got {}",
                self.max_black_block
            ));
        }
        if self.max_retries == 0 {
            problems.push("max_retries must be at least 1".to_string());
        }
        if !(0.0..=10.0).contains(&self.quality_threshold) {
            problems.push(format!(
                "quality_threshold must be in [0, 10], got {}",
                self.quality_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.randomness) {
            problems.push(format!(
                "randomness must be in [0, 1], got {}",
                self.randomness
            ));
        }
        if !(0.0..=1.0).contains(&self.randomness_step) {
            problems.push(format!(
                "randomness_step must be in [0, 1], got {}",
                self.randomness_step
            ));
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            problems.push(format!(
                "max_retry_delay_ms ({}) is below retry_delay_ms ({})",
                self.max_retry_delay_ms, self.retry_delay_ms
            ));
        }
        // An all-white grid is legal once both sides reach the minimum word length;
        // anything smaller has no legal layout at all.
        if self.grid_rows > 0
            && self.grid_cols > 0
            && (self.grid_rows < self.min_word_length || self.grid_cols < self.min_word_length)
        {
            problems.push(format!(
                "a {}x{} grid admits no layout with words of at least {} letters",
                self.grid_rows, self.grid_cols, self.min_word_length
            ));
        }

        problems
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ConfigError(problems.join("; ")))
        }
    }
}

/// Worker pool, timeouts and retention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub workers: usize,
    pub generation_timeout_secs: u64,
    pub retention_secs: u64,
    /// Sled archive for terminal job records; no archive when unset
    pub archive_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            generation_timeout_secs: 120,
            retention_secs: 3600,
            archive_path: None,
        }
    }
}

/// Provider used for each generation stage, by provider name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub default: Option<String>,
    pub grid: Option<String>,
    pub fill: Option<String>,
    pub clues: Option<String>,
}

impl StagesConfig {
    pub fn provider_for(&self, stage: crate::generation::GenerationStage) -> Option<&str> {
        use crate::generation::GenerationStage;
        let specific = match stage {
            GenerationStage::Grid => &self.grid,
            GenerationStage::Fill => &self.fill,
            GenerationStage::Clues => &self.clues,
        };
        specific.as_deref().or(self.default.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Word list, one entry per line; dictionary checks are skipped when unset
    pub path: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CruciverbConfig {
    #[serde(default)]
    pub construction: ConstructionConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Model provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub stages: StagesConfig,

    #[serde(default)]
    pub lexicon: LexiconConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Construction(String),
    Pipeline(String),
    Provider(String, String),
    Stage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Construction(msg) => write!(f, "Construction: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Stage(msg) => write!(f, "Stages: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CruciverbConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors: Vec<ValidationError> = self
            .construction
            .problems()
            .into_iter()
            .map(ValidationError::Construction)
            .collect();

        if self.pipeline.workers == 0 {
            errors.push(ValidationError::Pipeline(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.pipeline.generation_timeout_secs == 0 {
            errors.push(ValidationError::Pipeline(
                "generation_timeout_secs must be at least 1".to_string(),
            ));
        }

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        for (stage, name) in [
            ("default", &self.stages.default),
            ("grid", &self.stages.grid),
            ("fill", &self.stages.fill),
            ("clues", &self.stages.clues),
        ] {
            if let Some(name) = name {
                if !self.providers.contains_key(name) {
                    errors.push(ValidationError::Stage(format!(
                        "{} stage references unknown provider '{}'",
                        stage, name
                    )));
                }
            }
        }

        if let Err(e) = crate::logging::validate(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every error into one `ApiError::ConfigError`
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Loads `CruciverbConfig` from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from all sources for the given workspace
    pub fn load(workspace_root: &Path) -> Result<CruciverbConfig, ApiError> {
        Self::load_with_global(workspace_root, sources::global_file::global_config_path())
    }

    /// Load with an explicit global file (or none) instead of the XDG lookup
    pub fn load_with_global(
        workspace_root: &Path,
        global: Option<PathBuf>,
    ) -> Result<CruciverbConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder, global)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);

        let config: CruciverbConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            workspace = %workspace_root.display(),
            providers = config.providers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load defaults plus a single file, without global, workspace or environment layers
    pub fn load_from_file(path: &Path) -> Result<CruciverbConfig, ApiError> {
        let config = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
