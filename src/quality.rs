//! Quality scoring
//!
//! Combines validator results into one score with fixed weights and decides
//! acceptance against a threshold. Pure and deterministic.

use crate::validation::{Issue, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GRID_WEIGHT: f64 = 0.4;
pub const FILL_WEIGHT: f64 = 0.4;
pub const SOLVABILITY_WEIGHT: f64 = 0.2;

/// Which validator produced a component result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Grid,
    Fill,
    Solvability,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Grid => write!(f, "grid"),
            Component::Fill => write!(f, "fill"),
            Component::Solvability => write!(f, "solvability"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: Component,
    pub weight: f64,
    pub subscore: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub components: Vec<ComponentScore>,
    pub score: f64,
    pub issues: Vec<Issue>,
}

impl QualityReport {
    pub fn subscore(&self, component: Component) -> Option<f64> {
        self.components
            .iter()
            .find(|score| score.component == component)
            .map(|score| score.subscore)
    }

    pub fn has_blocking(&self) -> bool {
        self.issues.iter().any(Issue::is_blocking)
    }

    /// No blocking issues and a score at or above `threshold`
    pub fn accepts(&self, threshold: f64) -> bool {
        !self.has_blocking() && self.score >= threshold
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score the three standard components with 40/40/20 weights
    pub fn score(
        &self,
        grid: &ValidationResult,
        fill: &ValidationResult,
        solvability: &ValidationResult,
    ) -> QualityReport {
        self.combine(&[
            (Component::Grid, GRID_WEIGHT, grid),
            (Component::Fill, FILL_WEIGHT, fill),
            (Component::Solvability, SOLVABILITY_WEIGHT, solvability),
        ])
    }

    /// Weighted sum of arbitrary (component, weight, result) triples
    pub fn combine(&self, parts: &[(Component, f64, &ValidationResult)]) -> QualityReport {
        let mut components = Vec::with_capacity(parts.len());
        let mut issues = Vec::new();
        let mut total = 0.0;

        for (component, weight, result) in parts {
            total += weight * result.subscore;
            components.push(ComponentScore {
                component: *component,
                weight: *weight,
                subscore: result.subscore,
                passed: result.passed,
            });
            issues.extend(result.issues.iter().cloned());
        }

        QualityReport {
            components,
            score: round2(total),
            issues,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
