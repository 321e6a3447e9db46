// Property tests for grid validation, scoring and retry policy

pub mod fill_invariants;
pub mod grid_invariants;
pub mod scoring;
