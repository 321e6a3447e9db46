//! Word list used for dictionary membership checks.

use crate::error::ApiError;
use crate::grid::normalize_answer;
use std::collections::HashSet;
use std::path::Path;

/// Set of normalized (uppercase, letters-only) words
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::new();
        for word in words {
            lexicon.insert(word.as_ref());
        }
        lexicon
    }

    /// Load a word list with one entry per line. Blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read lexicon {}: {}",
                path.display(),
                e
            ))
        })?;
        let lexicon = Self::parse(&contents);
        tracing::debug!(path = %path.display(), words = lexicon.len(), "Loaded lexicon");
        Ok(lexicon)
    }

    pub fn parse(contents: &str) -> Self {
        Self::from_words(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn insert(&mut self, word: &str) -> bool {
        let normalized = normalize_answer(word);
        if normalized.is_empty() {
            return false;
        }
        self.words.insert(normalized)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&normalize_answer(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
