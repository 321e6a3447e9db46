//! Fill validation: answer placement, crossings, duplicates, dictionary and letter patterns.

use super::{Issue, IssueKind, Lexicon, ValidationResult, MAX_SUBSCORE};
use crate::config::ConstructionConfig;
use crate::grid::{normalize_answer, Answer, Coord, Direction, Grid};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

pub const GEOMETRY_PENALTY: f64 = 2.0;
pub const MISSING_ANSWER_PENALTY: f64 = 1.0;
pub const CROSSING_PENALTY: f64 = 2.0;
pub const DUPLICATE_PENALTY: f64 = 2.0;
pub const UNKNOWN_WORD_PENALTY: f64 = 1.0;

/// Answers scoring below this get an advisory issue
pub const PATTERN_ADVISORY_THRESHOLD: f64 = 0.6;

const VOWELS: &[char] = &['A', 'E', 'I', 'O', 'U'];

/// Lexical legality checks for a filled grid
#[derive(Debug, Clone)]
pub struct FillValidator {
    pub min_word_length: usize,
    lexicon: Option<Arc<Lexicon>>,
}

impl Default for FillValidator {
    fn default() -> Self {
        Self::from_config(&ConstructionConfig::default(), None)
    }
}

impl FillValidator {
    pub fn from_config(config: &ConstructionConfig, lexicon: Option<Arc<Lexicon>>) -> Self {
        Self {
            min_word_length: config.min_word_length,
            lexicon,
        }
    }

    pub fn with_lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon.as_deref()
    }

    /// Validate `answers` against the letters in `grid`. Words in `theme_words`
    /// are accepted even when the lexicon lacks them.
    pub fn validate(
        &self,
        grid: &Grid,
        answers: &[Answer],
        theme_words: &[String],
    ) -> ValidationResult {
        let mut issues = Vec::new();

        let placed = self.check_geometry(grid, answers, &mut issues);
        self.check_coverage(grid, answers, &mut issues);
        check_crossings(grid, &placed, &mut issues);
        check_duplicates(answers, &mut issues);
        if let Some(lexicon) = &self.lexicon {
            check_dictionary(lexicon, answers, theme_words, &mut issues);
        }
        let mean = check_letter_patterns(answers, &mut issues);

        ValidationResult::with_base(MAX_SUBSCORE * mean, issues)
    }

    /// Returns the answers that sit exactly on a slot
    fn check_geometry<'a>(
        &self,
        grid: &Grid,
        answers: &'a [Answer],
        issues: &mut Vec<Issue>,
    ) -> Vec<&'a Answer> {
        let slots: HashMap<(Direction, Coord), usize> = grid
            .slots(self.min_word_length)
            .into_iter()
            .map(|slot| ((slot.direction, slot.start), slot.length))
            .collect();

        let mut placed = Vec::new();
        for answer in answers {
            let cells: Vec<Coord> = answer.cells().collect();
            let problem = if answer.is_empty() {
                Some("has no letters".to_string())
            } else if let Some(bad) = cells.iter().find(|coord| !grid.in_bounds(**coord)) {
                Some(format!("runs off the grid at {}", bad))
            } else if let Some(bad) = cells.iter().find(|coord| grid.is_black(**coord)) {
                Some(format!("crosses the black square at {}", bad))
            } else {
                match slots.get(&(answer.direction, answer.start)) {
                    None => Some(format!("does not start a word slot at {}", answer.start)),
                    Some(length) if *length != answer.len() => Some(format!(
                        "has {} letters but its slot holds {}",
                        answer.len(),
                        length
                    )),
                    Some(_) => None,
                }
            };

            match problem {
                Some(problem) => issues.push(
                    Issue::blocking(
                        IssueKind::AnswerGeometry,
                        format!("{} {:?} {}", answer.direction, answer.text, problem),
                        GEOMETRY_PENALTY,
                    )
                    .with_cells(cells.into_iter().filter(|coord| grid.in_bounds(*coord))),
                ),
                None => placed.push(answer),
            }
        }
        placed
    }

    fn check_coverage(&self, grid: &Grid, answers: &[Answer], issues: &mut Vec<Issue>) {
        let claimed: HashSet<(Direction, Coord)> = answers
            .iter()
            .map(|answer| (answer.direction, answer.start))
            .collect();

        for slot in grid.slots(self.min_word_length) {
            if !claimed.contains(&(slot.direction, slot.start)) {
                issues.push(
                    Issue::blocking(
                        IssueKind::MissingAnswer,
                        format!("No answer for {} {}", slot.number, slot.direction),
                        MISSING_ANSWER_PENALTY,
                    )
                    .with_cells(slot.cells().collect::<Vec<_>>()),
                );
            }
        }
    }
}

fn check_crossings(grid: &Grid, placed: &[&Answer], issues: &mut Vec<Issue>) {
    let mut claimed: HashMap<Coord, (char, &Answer)> = HashMap::new();
    let mut reported: HashSet<Coord> = HashSet::new();

    for answer in placed {
        for (coord, letter) in answer.cells().zip(answer.letters()) {
            match claimed.get(&coord) {
                Some((existing, other)) if *existing != letter => {
                    if reported.insert(coord) {
                        issues.push(
                            Issue::blocking(
                                IssueKind::CrossingMismatch,
                                format!(
                                    "{} {} has {} at {} but {} {} has {}",
                                    other.direction,
                                    other.text,
                                    existing,
                                    coord,
                                    answer.direction,
                                    answer.text,
                                    letter
                                ),
                                CROSSING_PENALTY,
                            )
                            .with_cells([coord]),
                        );
                    }
                }
                Some(_) => {}
                None => {
                    claimed.insert(coord, (letter, answer));
                }
            }

            if let Some(in_grid) = grid.letter(coord) {
                if in_grid != letter && reported.insert(coord) {
                    issues.push(
                        Issue::blocking(
                            IssueKind::CrossingMismatch,
                            format!(
                                "{} {} has {} at {} but the grid holds {}",
                                answer.direction, answer.text, letter, coord, in_grid
                            ),
                            CROSSING_PENALTY,
                        )
                        .with_cells([coord]),
                    );
                }
            }
        }
    }
}

/// Case-, accent- and punctuation-insensitive duplicate detection
fn check_duplicates(answers: &[Answer], issues: &mut Vec<Issue>) {
    let mut groups: BTreeMap<String, Vec<&Answer>> = BTreeMap::new();
    for answer in answers {
        let key = answer.normalized();
        if !key.is_empty() {
            groups.entry(key).or_default().push(answer);
        }
    }

    for (word, group) in groups.into_iter().filter(|(_, group)| group.len() > 1) {
        let spellings: Vec<&str> = group.iter().map(|answer| answer.text.as_str()).collect();
        issues.push(
            Issue::blocking(
                IssueKind::DuplicateWord,
                format!("Duplicate word {}: {}", word, spellings.join(", ")),
                DUPLICATE_PENALTY,
            )
            .with_cells(group.iter().map(|answer| answer.start)),
        );
    }
}

fn check_dictionary(
    lexicon: &Lexicon,
    answers: &[Answer],
    theme_words: &[String],
    issues: &mut Vec<Issue>,
) {
    let whitelist: HashSet<String> = theme_words
        .iter()
        .map(|word| normalize_answer(word))
        .collect();

    for answer in answers {
        let word = answer.normalized();
        if word.is_empty() || answer.is_theme || whitelist.contains(&word) {
            continue;
        }
        if !lexicon.contains(&word) {
            issues.push(
                Issue::blocking(
                    IssueKind::UnknownWord,
                    format!("Word not in dictionary: {}", word),
                    UNKNOWN_WORD_PENALTY,
                )
                .with_cells(answer.cells().collect::<Vec<_>>()),
            );
        }
    }
}

/// Returns the length-weighted mean pattern score, 1.0 when there are no answers
fn check_letter_patterns(answers: &[Answer], issues: &mut Vec<Issue>) -> f64 {
    let mut weighted = 0.0;
    let mut total_len = 0usize;

    for answer in answers {
        let word = answer.normalized();
        let len = word.chars().count();
        if len == 0 {
            continue;
        }
        let score = letter_pattern_score(&word);
        weighted += score * len as f64;
        total_len += len;

        if score < PATTERN_ADVISORY_THRESHOLD {
            issues.push(
                Issue::advisory(
                    IssueKind::PoorLetterPattern,
                    format!("Low-quality fill: {} (pattern score {:.2})", word, score),
                    0.0,
                )
                .with_cells(answer.cells().collect::<Vec<_>>()),
            );
        }
    }

    if total_len == 0 {
        1.0
    } else {
        weighted / total_len as f64
    }
}

/// Score a word's letter pattern in [0, 1].
///
/// Penalizes vowel density outside 25%-60% (Y counts as a vowel here), runs of
/// four or more vowels, runs of five or more consonants, and words of two
/// letters or fewer.
pub fn letter_pattern_score(word: &str) -> f64 {
    let letters: Vec<char> = normalize_answer(word).chars().collect();
    if letters.is_empty() {
        return 0.0;
    }

    let mut score = 1.0;
    if letters.len() <= 2 {
        score -= 0.4;
    }

    let vowel_like = letters
        .iter()
        .filter(|c| VOWELS.contains(c) || **c == 'Y')
        .count();
    let density = vowel_like as f64 / letters.len() as f64;
    if density < 0.25 {
        score -= (0.25 - density) * 2.0;
    } else if density > 0.6 {
        score -= (density - 0.6) * 1.25;
    }

    let mut vowel_run = 0;
    let mut consonant_run = 0;
    let mut long_vowel_run = false;
    let mut long_consonant_run = false;
    for c in &letters {
        if VOWELS.contains(c) {
            vowel_run += 1;
            consonant_run = 0;
        } else {
            consonant_run += 1;
            vowel_run = 0;
        }
        long_vowel_run |= vowel_run >= 4;
        long_consonant_run |= consonant_run >= 5;
    }
    if long_vowel_run {
        score -= 0.3;
    }
    if long_consonant_run {
        score -= 0.3;
    }

    score.clamp(0.0, 1.0)
}
