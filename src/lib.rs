//! Cruciverb: Staged Crossword Construction
//!
//! Builds crossword puzzles in stages (grid, fill, clues), validating each
//! artifact before moving on and scoring the finished puzzle. Generation is
//! delegated to a pluggable collaborator; everything else is deterministic.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod grid;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod puzzle;
pub mod quality;
pub mod service;
pub mod store;
pub mod validation;
