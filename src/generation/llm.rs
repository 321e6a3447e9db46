//! LLM-backed generation collaborator.

use super::{parse, prompt, Artifact, GenerationCollaborator, GenerationRequest, GenerationStage};
use crate::config::CruciverbConfig;
use crate::error::{ApiError, GenerationError};
use crate::provider::{CompletionOptions, ModelProviderClient, ProviderRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

struct StageClient {
    client: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
}

/// Renders a prompt per stage, calls the stage's provider and parses the JSON reply.
/// The request's randomness becomes the sampling temperature.
pub struct LlmCollaborator {
    grid: StageClient,
    fill: StageClient,
    clues: StageClient,
}

impl LlmCollaborator {
    /// One client for every stage
    pub fn new(client: Arc<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        let stage = || StageClient {
            client: client.clone(),
            options: options.clone(),
        };
        Self {
            grid: stage(),
            fill: stage(),
            clues: stage(),
        }
    }

    pub fn with_stage_client(
        mut self,
        stage: GenerationStage,
        client: Arc<dyn ModelProviderClient>,
        options: CompletionOptions,
    ) -> Self {
        *self.stage_mut(stage) = StageClient { client, options };
        self
    }

    /// Build from the `[providers]` and `[stages]` config sections
    pub fn from_config(config: &CruciverbConfig) -> Result<Self, ApiError> {
        let registry = ProviderRegistry::from_config(config);
        let resolve = |stage: GenerationStage| -> Result<StageClient, ApiError> {
            let name = config.stages.provider_for(stage).ok_or_else(|| {
                ApiError::ProviderNotConfigured(format!(
                    "No provider configured for the {} stage (set stages.{} or stages.default)",
                    stage, stage
                ))
            })?;
            Ok(StageClient {
                client: registry.create_client(name)?,
                options: registry.get_or_error(name)?.default_options.clone(),
            })
        };

        Ok(Self {
            grid: resolve(GenerationStage::Grid)?,
            fill: resolve(GenerationStage::Fill)?,
            clues: resolve(GenerationStage::Clues)?,
        })
    }

    fn stage(&self, stage: GenerationStage) -> &StageClient {
        match stage {
            GenerationStage::Grid => &self.grid,
            GenerationStage::Fill => &self.fill,
            GenerationStage::Clues => &self.clues,
        }
    }

    fn stage_mut(&mut self, stage: GenerationStage) -> &mut StageClient {
        match stage {
            GenerationStage::Grid => &mut self.grid,
            GenerationStage::Fill => &mut self.fill,
            GenerationStage::Clues => &mut self.clues,
        }
    }
}

/// Provider timeouts stay timeouts; every other provider failure is a rejection
pub fn map_provider_error(error: ApiError) -> GenerationError {
    match error {
        ApiError::ProviderTimeout(msg) => GenerationError::Timeout(msg),
        other => GenerationError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl GenerationCollaborator for LlmCollaborator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Artifact, GenerationError> {
        let stage = self.stage(request.stage);
        let mut options = stage.options.clone();
        options.temperature = Some(request.randomness.clamp(0.0, 1.0) as f32);

        let messages = prompt::render(request);
        debug!(
            stage = %request.stage,
            provider = stage.client.provider_name(),
            model = stage.client.model_name(),
            temperature = ?options.temperature,
            "Requesting artifact"
        );

        let response = stage
            .client
            .complete(messages, options)
            .await
            .map_err(map_provider_error)?;
        debug!(
            stage = %request.stage,
            completion_tokens = response.usage.completion_tokens,
            "Received completion"
        );

        parse::parse_artifact(request, &response.content)
    }
}
