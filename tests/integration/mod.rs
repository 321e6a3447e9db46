// Integration tests module
// This module contains all integration tests organized by area

pub mod config_integration;
pub mod job_store;
pub mod llm_collaborator;
pub mod pipeline_flow;
pub mod support;
pub mod validation_flow;
