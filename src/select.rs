//! Search for a shape multiset that makes a puzzle uniquely solvable.
//!
//! Given a board with a target and a catalog of available shapes, the
//! selector walks multisets of catalog shapes in order of increasing size
//! and hands each exactly-covering candidate to the exact-cover solver,
//! accepting the first whose solution count equals the multiset's
//! duplicate factor (one distinguishable tiling).

use crate::board::Board;
use crate::cover::CoverMatrix;
use crate::shape::Shape;
use crate::solver::{Deadline, Solver};

/// How a selection run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A uniquely solvable multiset was found; the payload is the catalog
    /// indices of its members (repeats allowed).
    Found(Vec<usize>),
    /// The deadline expired before the search finished.
    Timeout,
    /// Even `max_shapes` copies of the largest usable shape cannot cover
    /// the target.
    TargetTooLarge,
    /// The catalog is empty.
    NoShapes,
    /// No catalog shape has a single valid placement on the target (or the
    /// target has no cells at all).
    NoValidPlacements,
    /// Every candidate multiset up to `max_shapes` either fails to cover
    /// the target or admits more than one distinguishable tiling.
    NoUniqueSolution,
}

/// Search counters reported alongside every outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectStats {
    /// Complete multisets that reached uniqueness verification.
    pub combinations_checked: u64,
    /// Branches cut by the arithmetic bounds.
    pub prunes: u64,
    /// Wall-clock time spent, in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome plus counters for one selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectResult {
    /// How the run ended.
    pub outcome: SelectOutcome,
    /// Search counters.
    pub stats: SelectStats,
}

/// A catalog shape that survived the pre-pass, with the data the ordering
/// heuristic and the pruning bounds need.
struct Candidate {
    catalog_index: usize,
    shape: Shape,
    cell_count: usize,
    rotation_count: usize,
    placement_count: usize,
}

/// Deadline cadence inside the DFS.
const DFS_CHECK_INTERVAL: u64 = 100;

/// Search for a multiset of up to `max_shapes` catalog shapes whose
/// induced cover problem has exactly one solution modulo permutations of
/// identical shapes.
///
/// The board's target (absent = all cells) defines what must be covered.
/// The search deadline is `max_millis` from entry; expiry anywhere in the
/// pre-pass, the DFS, a matrix build, or a solve yields
/// [`SelectOutcome::Timeout`].
pub fn select_shapes(
    board: &Board,
    catalog: &[Shape],
    max_shapes: usize,
    max_millis: u64,
) -> SelectResult {
    let deadline = Deadline::after_millis(max_millis);
    let mut stats = SelectStats::default();

    let outcome = run_selection(board, catalog, max_shapes, deadline, &mut stats);
    stats.elapsed_ms = max_millis.saturating_sub(deadline.remaining_millis());

    log::debug!(
        "Shape selection finished: {} after {} combination(s), {} prune(s), {} ms.",
        discriminant_name(&outcome),
        stats.combinations_checked,
        stats.prunes,
        stats.elapsed_ms
    );

    SelectResult { outcome, stats }
}

fn discriminant_name(outcome: &SelectOutcome) -> &'static str {
    match outcome {
        SelectOutcome::Found(_) => "Found",
        SelectOutcome::Timeout => "Timeout",
        SelectOutcome::TargetTooLarge => "TargetTooLarge",
        SelectOutcome::NoShapes => "NoShapes",
        SelectOutcome::NoValidPlacements => "NoValidPlacements",
        SelectOutcome::NoUniqueSolution => "NoUniqueSolution",
    }
}

fn run_selection(
    board: &Board,
    catalog: &[Shape],
    max_shapes: usize,
    deadline: Deadline,
    stats: &mut SelectStats,
) -> SelectOutcome {
    if catalog.is_empty() {
        return SelectOutcome::NoShapes;
    }

    let target_cells = board.target_cell_count();
    if target_cells == 0 {
        // Nothing to cover: no playable puzzle can come out of this.
        return SelectOutcome::NoValidPlacements;
    }

    // Pre-pass: per catalog shape, drop what cannot participate and count
    // the valid single-shape placements the ordering heuristic uses.
    let mut candidates: Vec<Candidate> = Vec::new();
    for (catalog_index, shape) in catalog.iter().enumerate() {
        let cell_count = shape.cell_count();
        if cell_count == 0 || cell_count > target_cells {
            continue;
        }

        let probe = CoverMatrix::build(board, std::slice::from_ref(shape), Some(deadline));
        if probe.timed_out() || deadline.expired() {
            return SelectOutcome::Timeout;
        }
        if probe.num_rows() == 0 {
            continue;
        }

        candidates.push(Candidate {
            catalog_index,
            shape: shape.clone(),
            cell_count,
            rotation_count: shape.unique_rotations().len(),
            placement_count: probe.num_rows(),
        });
    }

    if candidates.is_empty() {
        return SelectOutcome::NoValidPlacements;
    }

    let max_cell_count = candidates
        .iter()
        .map(|candidate| candidate.cell_count)
        .max()
        .unwrap_or(0);
    if max_cell_count * max_shapes < target_cells {
        return SelectOutcome::TargetTooLarge;
    }

    // Most-constrained shapes first: fewest placements, then most
    // rotations, then largest footprint. The order is fixed for the whole
    // search.
    candidates.sort_by(|a, b| {
        a.placement_count
            .cmp(&b.placement_count)
            .then(b.rotation_count.cmp(&a.rotation_count))
            .then(b.cell_count.cmp(&a.cell_count))
    });

    // suffix_max_cells[i] = the largest footprint available from index i on,
    // for the "even the best remaining shape cannot finish" bound.
    let mut suffix_max_cells = vec![0usize; candidates.len()];
    let mut running_max = 0;
    for index in (0..candidates.len()).rev() {
        running_max = running_max.max(candidates[index].cell_count);
        suffix_max_cells[index] = running_max;
    }

    let mut search = Search {
        board,
        candidates,
        suffix_max_cells,
        target_cells,
        deadline,
        stats,
        dfs_steps: 0,
        current: Vec::new(),
    };

    let min_depth = target_cells.div_ceil(max_cell_count);
    for depth in min_depth..=max_shapes {
        log::debug!("Deepening to multiset size {}.", depth);
        match search.dfs(depth, 0, 0) {
            DfsOutcome::Found(indices) => return SelectOutcome::Found(indices),
            DfsOutcome::Timeout => return SelectOutcome::Timeout,
            DfsOutcome::Exhausted => {}
        }
    }

    SelectOutcome::NoUniqueSolution
}

enum DfsOutcome {
    Found(Vec<usize>),
    Timeout,
    Exhausted,
}

struct Search<'a> {
    board: &'a Board,
    candidates: Vec<Candidate>,
    suffix_max_cells: Vec<usize>,
    target_cells: usize,
    deadline: Deadline,
    stats: &'a mut SelectStats,
    dfs_steps: u64,
    // candidate indices of the multiset under construction
    current: Vec<usize>,
}

impl Search<'_> {
    /// Explore non-decreasing candidate-index sequences so each multiset
    /// is visited exactly once.
    fn dfs(&mut self, slots_left: usize, start_index: usize, covered: usize) -> DfsOutcome {
        self.dfs_steps += 1;
        if self.dfs_steps % DFS_CHECK_INTERVAL == 0 && self.deadline.expired() {
            return DfsOutcome::Timeout;
        }

        if covered == self.target_cells {
            self.stats.combinations_checked += 1;
            return match self.verify_unique() {
                Verdict::Unique => {
                    let indices = self
                        .current
                        .iter()
                        .map(|&candidate| self.candidates[candidate].catalog_index)
                        .collect();
                    DfsOutcome::Found(indices)
                }
                Verdict::NotUnique => DfsOutcome::Exhausted,
                Verdict::Timeout => DfsOutcome::Timeout,
            };
        }
        if slots_left == 0 {
            return DfsOutcome::Exhausted;
        }

        for index in start_index..self.candidates.len() {
            // Even filling every remaining slot with the largest shape
            // still available cannot reach the target.
            if covered + slots_left * self.suffix_max_cells[index] < self.target_cells {
                self.stats.prunes += 1;
                break;
            }
            // This shape alone overshoots what is left to cover.
            if self.candidates[index].cell_count > self.target_cells - covered {
                self.stats.prunes += 1;
                continue;
            }

            self.current.push(index);
            let outcome = self.dfs(
                slots_left - 1,
                index,
                covered + self.candidates[index].cell_count,
            );
            self.current.pop();

            match outcome {
                DfsOutcome::Exhausted => {}
                other => return other,
            }
        }

        DfsOutcome::Exhausted
    }

    /// Solve the candidate multiset and compare the solution count against
    /// the duplicate factor.
    fn verify_unique(&mut self) -> Verdict {
        let shapes: Vec<Shape> = self
            .current
            .iter()
            .map(|&candidate| self.candidates[candidate].shape.clone())
            .collect();

        let matrix = CoverMatrix::build(self.board, &shapes, Some(self.deadline));
        if matrix.timed_out() {
            return Verdict::Timeout;
        }
        if matrix.is_empty() {
            return Verdict::NotUnique;
        }

        let factor = matrix.duplicate_factor();
        let mut solver = Solver::new(&matrix, Some(self.deadline));
        let count = solver.count_solutions(factor as usize + 1) as u64;
        if solver.timed_out() {
            return Verdict::Timeout;
        }

        if count == factor {
            Verdict::Unique
        } else {
            Verdict::NotUnique
        }
    }
}

enum Verdict {
    Unique,
    NotUnique,
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_SECONDS: u64 = 5_000;

    fn full_board(rows: usize, cols: usize) -> Board {
        Board::with_target(rows, cols, vec![true; rows * cols])
    }

    #[test]
    fn square_piece_on_its_own_board_is_found() {
        let board = full_board(2, 2);
        let catalog = vec![Shape::from_rows(&["##", "##"])];

        let result = select_shapes(&board, &catalog, 4, FIVE_SECONDS);
        match result.outcome {
            SelectOutcome::Found(indices) => assert_eq!(indices, vec![0]),
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(result.stats.combinations_checked >= 1);
    }

    #[test]
    fn domino_pair_on_a_square_board_is_ambiguous() {
        // Two dominoes tile a 2x2 board horizontally or vertically: two
        // distinguishable tilings, so the solution count (4) exceeds the
        // duplicate factor (2) and the pair is rejected.
        let board = full_board(2, 2);
        let catalog = vec![Shape::from_rows(&["##"])];

        let result = select_shapes(&board, &catalog, 4, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::NoUniqueSolution);
    }

    #[test]
    fn long_bars_beat_short_bars_on_a_two_by_three_board() {
        let board = full_board(2, 3);
        let catalog = vec![Shape::from_rows(&["##"]), Shape::from_rows(&["###"])];

        let result = select_shapes(&board, &catalog, 4, FIVE_SECONDS);
        match result.outcome {
            // The only vertical-free tiling: two 1x3 bars stacked.
            SelectOutcome::Found(indices) => assert_eq!(indices, vec![1, 1]),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn odd_cell_count_cannot_be_tiled_by_dominoes() {
        let board = full_board(3, 3);
        let catalog = vec![Shape::from_rows(&["##"])];

        let result = select_shapes(&board, &catalog, 6, FIVE_SECONDS);
        assert!(
            matches!(
                result.outcome,
                SelectOutcome::NoValidPlacements
                    | SelectOutcome::NoUniqueSolution
                    | SelectOutcome::TargetTooLarge
            ),
            "9 cells are not tileable by dominoes, got {:?}",
            result.outcome
        );
    }

    #[test]
    fn empty_catalog_is_no_shapes() {
        let board = full_board(2, 2);
        let result = select_shapes(&board, &[], 4, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::NoShapes);
    }

    #[test]
    fn oversized_shapes_leave_no_placements() {
        let board = full_board(1, 1);
        let catalog = vec![Shape::from_rows(&["##"])];
        let result = select_shapes(&board, &catalog, 4, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::NoValidPlacements);
    }

    #[test]
    fn too_few_allowed_pieces_is_target_too_large() {
        let board = full_board(2, 3);
        let catalog = vec![Shape::from_rows(&["##"])];
        // Two dominoes cover at most 4 of the 6 cells.
        let result = select_shapes(&board, &catalog, 2, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::TargetTooLarge);
    }

    #[test]
    fn split_target_with_dots_is_unique_modulo_symmetry() {
        let board = Board::with_target(2, 2, vec![true, false, false, true]);
        let catalog = vec![Shape::from_rows(&["#"])];

        let result = select_shapes(&board, &catalog, 2, FIVE_SECONDS);
        match result.outcome {
            SelectOutcome::Found(indices) => assert_eq!(indices, vec![0, 0]),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn ambiguous_puzzle_is_not_unique() {
        // A 2x4 target tiled by four dominoes has five distinguishable
        // tilings; the only candidate multiset is rejected.
        let board = full_board(2, 4);
        let catalog = vec![Shape::from_rows(&["##"])];
        let result = select_shapes(&board, &catalog, 4, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::NoUniqueSolution);
        assert!(result.stats.combinations_checked >= 1);
    }

    #[test]
    fn expired_deadline_times_out() {
        let board = full_board(4, 4);
        let catalog = vec![Shape::from_rows(&["##"]), Shape::from_rows(&["#", "#"])];
        let result = select_shapes(&board, &catalog, 8, 0);
        assert_eq!(result.outcome, SelectOutcome::Timeout);
    }

    #[test]
    fn zero_cell_target_has_nothing_to_cover() {
        let board = Board::with_target(2, 2, vec![false; 4]);
        let catalog = vec![Shape::from_rows(&["#"])];
        let result = select_shapes(&board, &catalog, 2, FIVE_SECONDS);
        assert_eq!(result.outcome, SelectOutcome::NoValidPlacements);
    }
}
