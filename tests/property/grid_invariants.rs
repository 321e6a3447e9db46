//! Property-based tests for grid structure invariants

use cruciverb::grid::{Coord, Grid};
use cruciverb::validation::grid::unreachable_cells;
use cruciverb::validation::{GridValidator, IssueKind};
use proptest::prelude::*;
use std::collections::HashSet;

/// Grids from 3x3 to 9x9 with roughly one black square in six
fn arb_grid() -> impl Strategy<Value = Grid> {
    (3usize..=9, 3usize..=9).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::bool::weighted(0.17), rows * cols).prop_map(move |blacks| {
            let mut grid = Grid::new(rows, cols).unwrap();
            for (index, black) in blacks.into_iter().enumerate() {
                if black {
                    grid.set_black(Coord::new(index / cols, index % cols)).unwrap();
                }
            }
            grid
        })
    })
}

/// Mirror every black square through the center
fn symmetrize(mut grid: Grid) -> Grid {
    let (rows, cols) = grid.dimensions();
    let blacks: Vec<Coord> = grid.coords().filter(|coord| grid.is_black(*coord)).collect();
    for coord in blacks {
        grid.set_black(Coord::new(rows - 1 - coord.row, cols - 1 - coord.col))
            .unwrap();
    }
    grid
}

/// Test that any grid the validator passes is connected, symmetric and within the ratio
#[test]
fn test_passing_grids_are_legal() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let validator = GridValidator::default();

    runner
        .run(&arb_grid().prop_map(symmetrize), |grid| {
            let result = validator.validate(&grid);
            if result.passed {
                prop_assert!(unreachable_cells(&grid).is_empty());
                prop_assert!(grid.black_ratio() <= validator.max_black_ratio + 1e-9);
                let (rows, cols) = grid.dimensions();
                for coord in grid.coords() {
                    let mirror = Coord::new(rows - 1 - coord.row, cols - 1 - coord.col);
                    prop_assert_eq!(grid.is_black(coord), grid.is_black(mirror));
                }
                prop_assert!(result.blocking_issues().next().is_none());
            }
            Ok(())
        })
        .unwrap();
}

/// Test that symmetrized grids never report asymmetry
#[test]
fn test_symmetrized_grids_are_symmetric() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let validator = GridValidator::default();

    runner
        .run(&arb_grid(), |grid| {
            let result = validator.validate(&symmetrize(grid));
            prop_assert!(!result.has_issue(IssueKind::Asymmetric));
            Ok(())
        })
        .unwrap();
}

proptest! {
    #[test]
    fn validation_is_deterministic(grid in arb_grid()) {
        let validator = GridValidator::default();
        prop_assert_eq!(validator.validate(&grid), validator.validate(&grid.clone()));
    }

    #[test]
    fn subscore_stays_in_range(grid in arb_grid()) {
        let result = GridValidator::default().validate(&grid);
        prop_assert!((0.0..=10.0).contains(&result.subscore));
        prop_assert_eq!(result.passed, result.blocking_issues().next().is_none());
    }

    #[test]
    fn numbering_counts_up_in_reading_order(grid in arb_grid()) {
        let numbering = grid.numbering(3);
        for (index, (_, number)) in numbering.iter().enumerate() {
            prop_assert_eq!(*number as usize, index + 1);
        }
        for pair in numbering.windows(2) {
            let (a, b) = (pair[0].0, pair[1].0);
            prop_assert!((a.row, a.col) < (b.row, b.col));
        }

        // every slot start carries a number and nothing else does
        let starts: HashSet<Coord> = grid.slots(3).iter().map(|slot| slot.start).collect();
        let numbered: HashSet<Coord> = numbering.iter().map(|(coord, _)| *coord).collect();
        prop_assert_eq!(starts, numbered);
    }

    #[test]
    fn unreachable_cells_are_white(grid in arb_grid()) {
        for coord in unreachable_cells(&grid) {
            prop_assert!(grid.is_white(coord));
        }
    }
}
