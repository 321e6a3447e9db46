//! Property-based tests for fills the validator accepts

use cruciverb::grid::{Coord, Grid};
use cruciverb::validation::FillValidator;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn letter() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['A', 'B', 'E'])
}

/// Rows of a 3x3 or 4x4 letter grid over a tiny alphabet, so repeats are common
fn arb_rows() -> impl Strategy<Value = Vec<String>> {
    (3usize..=4).prop_flat_map(|n| {
        prop::collection::vec(
            prop::collection::vec(letter(), n).prop_map(|row| row.into_iter().collect()),
            n,
        )
    })
}

/// Test that accepted fills agree at every crossing and never repeat a word
#[test]
fn test_accepted_fills_are_consistent() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let validator = FillValidator::default();

    runner
        .run(
            &(arb_rows(), any::<prop::sample::Index>(), "[abe]{3,4}", any::<bool>()),
            |(rows, index, replacement, perturb)| {
                let grid = Grid::from_pattern(rows.as_slice()).unwrap();
                let mut answers = grid.answers(3).unwrap();
                if perturb {
                    let i = index.index(answers.len());
                    answers[i].text = replacement;
                }

                let result = validator.validate(&grid, &answers, &[]);
                if !result.passed {
                    return Ok(());
                }

                let mut letters: HashMap<Coord, char> = HashMap::new();
                for answer in &answers {
                    for (coord, ch) in answer.cells().zip(answer.letters()) {
                        let seen = *letters.entry(coord).or_insert(ch);
                        prop_assert_eq!(seen, ch);
                    }
                }
                let words: HashSet<String> = answers.iter().map(|a| a.normalized()).collect();
                prop_assert_eq!(words.len(), answers.len());
                Ok(())
            },
        )
        .unwrap();
}
