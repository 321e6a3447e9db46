//! Merge rules: defaults first, later sources override earlier ones key by key.

use crate::config::{ConstructionConfig, PipelineConfig};
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let construction = ConstructionConfig::default();
    let pipeline = PipelineConfig::default();
    let logging = LoggingConfig::default();

    Config::builder()
        .set_default(
            "construction.min_word_length",
            construction.min_word_length as i64,
        )?
        .set_default("construction.max_black_ratio", construction.max_black_ratio)?
        .set_default(
            "construction.max_black_block",
            construction.max_black_block as i64,
        )?
        .set_default("construction.max_retries", construction.max_retries as i64)?
        .set_default(
            "construction.quality_threshold",
            construction.quality_threshold,
        )?
        .set_default("construction.grid_rows", construction.grid_rows as i64)?
        .set_default("construction.grid_cols", construction.grid_cols as i64)?
        .set_default("construction.require_symmetry", construction.require_symmetry)?
        .set_default("construction.randomness", construction.randomness)?
        .set_default("construction.randomness_step", construction.randomness_step)?
        .set_default(
            "construction.retry_delay_ms",
            construction.retry_delay_ms as i64,
        )?
        .set_default(
            "construction.max_retry_delay_ms",
            construction.max_retry_delay_ms as i64,
        )?
        .set_default("pipeline.workers", pipeline.workers as i64)?
        .set_default(
            "pipeline.generation_timeout_secs",
            pipeline.generation_timeout_secs as i64,
        )?
        .set_default("pipeline.retention_secs", pipeline.retention_secs as i64)?
        .set_default("logging.level", logging.level)?
        .set_default("logging.format", logging.format)?
        .set_default("logging.output", logging.output)
}
