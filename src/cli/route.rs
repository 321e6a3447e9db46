//! CLI route: single route table and run context. Dispatches to domain services and output.

use crate::cli::output::{format_job_list_text, format_job_text, format_report_text};
use crate::cli::parse::{Commands, ConfigCommands, JobCommands};
use crate::config::{ConfigLoader, CruciverbConfig};
use crate::error::ApiError;
use crate::generation::LlmCollaborator;
use crate::pipeline::{JobId, JobRecord, JobResult};
use crate::puzzle::{Difficulty, GridSize, Puzzle};
use crate::quality::QualityScorer;
use crate::service::{ConstructionRequest, ConstructionService};
use crate::store::{JobArchive, SledJobArchive};
use crate::validation::{FillValidator, GridValidator, Lexicon, SolvabilityChecker};
use chrono::Utc;
use directories::ProjectDirs;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CruciverbConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn from_config(workspace_root: PathBuf, config: CruciverbConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &CruciverbConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Construct {
                theme,
                size,
                difficulty,
                theme_words,
                max_retries,
                threshold,
                timeout_secs,
                output,
                format,
            } => {
                let mut config = self.config.clone();
                if let Some(retries) = max_retries {
                    config.construction.max_retries = *retries;
                }
                if let Some(threshold) = threshold {
                    config.construction.quality_threshold = *threshold;
                }
                let difficulty: Difficulty = difficulty.parse().map_err(ApiError::ConfigError)?;
                let mut request = ConstructionRequest::new(theme.clone())
                    .with_difficulty(difficulty)
                    .with_theme_words(theme_words.iter().cloned());
                if let Some(size) = size {
                    let size: GridSize = size.parse().map_err(ApiError::ConfigError)?;
                    request = request.with_size(size);
                }
                self.handle_construct(
                    config,
                    request,
                    timeout_secs.map(Duration::from_secs),
                    output.as_deref(),
                    format,
                )
            }
            Commands::Validate {
                puzzle,
                lexicon,
                format,
            } => self.handle_validate(puzzle, lexicon.as_deref(), format),
            Commands::Job { command } => self.handle_job_command(command),
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    /// Archive location: configured path, else the platform data directory
    fn archive_path(&self) -> Option<PathBuf> {
        self.config.pipeline.archive_path.clone().or_else(|| {
            ProjectDirs::from("", "", "cruciverb").map(|dirs| dirs.data_dir().join("jobs"))
        })
    }

    fn open_archive(&self) -> Result<SledJobArchive, ApiError> {
        let path = self.archive_path().ok_or_else(|| {
            ApiError::ConfigError(
                "No archive location: set pipeline.archive_path".to_string(),
            )
        })?;
        Ok(SledJobArchive::open(path)?)
    }

    fn handle_construct(
        &self,
        mut config: CruciverbConfig,
        request: ConstructionRequest,
        timeout: Option<Duration>,
        output: Option<&Path>,
        format: &str,
    ) -> Result<String, ApiError> {
        config.ensure_valid()?;
        config.pipeline.archive_path = self.archive_path();
        let threshold = config.construction.quality_threshold;

        let collaborator = Arc::new(LlmCollaborator::from_config(&config)?);
        let service = ConstructionService::from_config(&config, collaborator)?;

        let rt = tokio::runtime::Runtime::new()?;
        let record = rt.block_on(async {
            service.start()?;
            let job_id = service.submit(request).await?;
            info!(job_id = %job_id, workspace = %self.workspace_root.display(), "Submitted construction job");
            let record = service.wait(&job_id, timeout).await;
            if record.is_err() {
                service.cancel(&job_id)?;
            }
            service.stop().await?;
            if record.is_ok() {
                service.store().archive_job(&job_id)?;
            }
            record
        })?;

        if let (Some(path), Some(JobResult::Puzzle(puzzle))) = (output, &record.result) {
            std::fs::write(path, serde_json::to_string_pretty(puzzle)?)?;
            info!(path = %path.display(), "Wrote puzzle");
        }

        render_record(&record, threshold, format)
    }

    fn handle_validate(
        &self,
        path: &Path,
        lexicon: Option<&Path>,
        format: &str,
    ) -> Result<String, ApiError> {
        let contents = std::fs::read_to_string(path)?;
        let puzzle: Puzzle = serde_json::from_str(&contents)?;
        let construction = &self.config.construction;

        let lexicon = match lexicon.or(self.config.lexicon.path.as_deref()) {
            Some(path) => Some(Arc::new(Lexicon::load(path)?)),
            None => None,
        };

        let grid = GridValidator::from_config(construction).validate(&puzzle.grid);
        let fill = FillValidator::from_config(construction, lexicon).validate(
            &puzzle.grid,
            &puzzle.answers,
            &puzzle.metadata.theme_words,
        );
        let solvability = SolvabilityChecker::new().check(&puzzle);
        let report = QualityScorer::new().score(&grid, &fill, &solvability);
        let threshold = construction.quality_threshold;

        if format == "json" {
            let value = json!({
                "accepted": report.accepts(threshold),
                "threshold": threshold,
                "report": report,
            });
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(format_report_text(&report, threshold))
        }
    }

    fn handle_job_command(&self, command: &JobCommands) -> Result<String, ApiError> {
        let archive = self.open_archive()?;
        let threshold = self.config.construction.quality_threshold;
        match command {
            JobCommands::Show { job_id, format } => {
                let job_id = JobId::from(job_id.as_str());
                let record = archive
                    .get(&job_id)?
                    .ok_or_else(|| ApiError::JobNotFound(job_id.to_string()))?;
                render_record(&record, threshold, format)
            }
            JobCommands::List { format } => {
                let records = archive.list()?;
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&records)?)
                } else {
                    Ok(format_job_list_text(&records))
                }
            }
            JobCommands::Prune => {
                let cutoff = chrono::Duration::from_std(Duration::from_secs(
                    self.config.pipeline.retention_secs,
                ))
                .ok()
                .and_then(|retention| Utc::now().checked_sub_signed(retention));
                let removed = match cutoff {
                    Some(cutoff) => archive.prune(cutoff)?,
                    None => 0,
                };
                archive.flush()?;
                Ok(format!("Pruned {} archived job(s)", removed))
            }
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show => self.config.to_toml(),
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok("Configuration is valid".to_string()),
                Err(errors) => {
                    let lines: Vec<String> =
                        errors.iter().map(|error| format!("  - {}", error)).collect();
                    Err(ApiError::ConfigError(format!(
                        "{} problem(s):\n{}",
                        errors.len(),
                        lines.join("\n")
                    )))
                }
            },
        }
    }
}

fn render_record(record: &JobRecord, threshold: f64, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        Ok(serde_json::to_string_pretty(record)?)
    } else {
        Ok(format_job_text(record, threshold))
    }
}
