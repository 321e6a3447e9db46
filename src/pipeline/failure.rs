//! Attempt failures and terminal failure reasons.

use crate::error::GenerationError;
use crate::pipeline::Stage;
use crate::validation::Issue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single attempt did not advance the job. Always retried within budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum AttemptFailure {
    GenerationFailure { error: GenerationError },
    ValidationFailure { issues: Vec<Issue> },
    QualityFailure {
        score: f64,
        threshold: f64,
        issues: Vec<Issue>,
    },
}

impl AttemptFailure {
    pub fn cause(&self) -> FailureCause {
        match self {
            AttemptFailure::GenerationFailure { .. } => FailureCause::GenerationFailure,
            AttemptFailure::ValidationFailure { .. } => FailureCause::ValidationFailure,
            AttemptFailure::QualityFailure { .. } => FailureCause::QualityFailure,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            AttemptFailure::GenerationFailure { .. } => &[],
            AttemptFailure::ValidationFailure { issues }
            | AttemptFailure::QualityFailure { issues, .. } => issues,
        }
    }

    /// One line per problem, fed back to the collaborator on retry
    pub fn feedback(&self) -> Vec<String> {
        match self {
            AttemptFailure::GenerationFailure { error } => vec![error.to_string()],
            AttemptFailure::ValidationFailure { issues } => issues
                .iter()
                .filter(|issue| issue.is_blocking())
                .map(|issue| issue.message.clone())
                .collect(),
            AttemptFailure::QualityFailure {
                score,
                threshold,
                issues,
            } => std::iter::once(format!(
                "quality score {:.2} is below {:.2}",
                score, threshold
            ))
            .chain(issues.iter().map(|issue| issue.message.clone()))
            .collect(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::GenerationFailure { error } => write!(f, "{}", error),
            AttemptFailure::ValidationFailure { issues } => {
                let blocking = issues.iter().filter(|issue| issue.is_blocking()).count();
                write!(f, "validation failed with {} blocking issue(s)", blocking)
            }
            AttemptFailure::QualityFailure {
                score, threshold, ..
            } => write!(f, "low quality: score {:.2} below {:.2}", score, threshold),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    GenerationFailure,
    ValidationFailure,
    QualityFailure,
}

/// How a job failed. Only these surface as job outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    ExhaustedRetries,
    ConfigurationError,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ExhaustedRetries => write!(f, "ExhaustedRetries"),
            FailureKind::ConfigurationError => write!(f, "ConfigurationError"),
            FailureKind::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    /// Cause of the last failed attempt, for exhausted retries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    pub message: String,
    /// Stage the job was in when it failed
    pub stage: Stage,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl FailureReason {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ConfigurationError,
            cause: None,
            message: message.into(),
            stage: Stage::GridGeneration,
            issues: Vec::new(),
        }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self {
            kind: FailureKind::Cancelled,
            cause: None,
            message: format!("cancelled during {}", stage),
            stage,
            issues: Vec::new(),
        }
    }

    pub fn exhausted(stage: Stage, attempts: u32, last: &AttemptFailure, issues: Vec<Issue>) -> Self {
        Self {
            kind: FailureKind::ExhaustedRetries,
            cause: Some(last.cause()),
            message: format!("{} failed after {} attempt(s): {}", stage, attempts, last),
            stage,
            issues,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.stage, self.message)
    }
}
