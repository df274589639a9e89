//! Algorithm X over the dancing-links grid, with MRV column choice,
//! bounded enumeration, and cooperative deadline-based cancellation.

use std::time::{Duration, Instant};

use crate::cover::CoverMatrix;
use crate::grid::Grid;

/// An absolute point in time after which cooperative work should stop.
///
/// There is no separate cancel token anywhere in the crate; a caller that
/// wants a hard cancel passes [`Deadline::now`].
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `millis` milliseconds from now.
    pub fn after_millis(millis: u64) -> Self {
        Deadline {
            at: Instant::now() + Duration::from_millis(millis),
        }
    }

    /// A deadline that has already passed.
    pub fn now() -> Self {
        Deadline { at: Instant::now() }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Milliseconds left before expiry, zero if already expired.
    pub fn remaining_millis(&self) -> u64 {
        self.at
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }
}

// Deadline cadence inside the search: every Nth recursive entry.
const RECURSION_CHECK_INTERVAL: u32 = 10;
// Deadline cadence while loading matrix rows into the grid.
const BUILD_CHECK_INTERVAL: usize = 100;

/// An exact-cover solver over one [`CoverMatrix`].
///
/// The solver owns its link structure exclusively and is built fresh per
/// invocation; nothing is shared or cached across solves. Enumeration
/// order is deterministic: MRV column choice with first-encountered
/// tie-break, rows visited in insertion order within a column.
///
/// A deadline expiry unwinds the search through the normal uncover
/// discipline and sets [`timed_out`](Solver::timed_out); results gathered
/// before the expiry are not to be trusted.
pub struct Solver {
    grid: Grid,
    deadline: Option<Deadline>,
    timed_out: bool,
    // recursive entries since the last deadline check
    entries_since_check: u32,
}

impl Solver {
    /// Build a solver for `matrix`.
    ///
    /// Row loading checks the deadline every 100 rows; if it expires the
    /// solver comes back already timed out and will not search.
    ///
    /// # Panics
    ///  - If the matrix has zero rows or zero columns.
    pub fn new(matrix: &CoverMatrix, deadline: Option<Deadline>) -> Self {
        Self::from_rows(matrix.num_columns(), matrix.sparse_rows(), deadline)
    }

    /// Build a solver for a raw 0/1 matrix, given as the sorted column
    /// indices of each row's 1-entries.
    ///
    /// # Panics
    ///  - If `rows` is empty or `num_columns` is zero.
    ///  - If any listed column index is out of range.
    pub fn from_rows(num_columns: usize, rows: &[Vec<usize>], deadline: Option<Deadline>) -> Self {
        assert!(!rows.is_empty(), "Cover matrix must have at least one row.");
        assert!(
            num_columns != 0,
            "Cover matrix must have at least one column."
        );
        for columns in rows {
            assert!(
                columns.iter().all(|&column| column < num_columns),
                "Row column index out of range [{:?}].",
                columns
            );
        }

        let mut grid = Grid::new(num_columns);
        let mut timed_out = false;
        for (index, columns) in rows.iter().enumerate() {
            grid.add_row(index, columns);
            if (index + 1) % BUILD_CHECK_INTERVAL == 0 {
                if let Some(deadline) = deadline {
                    if deadline.expired() {
                        timed_out = true;
                        break;
                    }
                }
            }
        }

        Solver {
            grid,
            deadline,
            timed_out,
            entries_since_check: 0,
        }
    }

    /// Whether a deadline cut the last build or search short.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Search until the first solution and return it, or `None` if the
    /// problem has no solution or the deadline expired.
    pub fn solve_first(&mut self) -> Option<Vec<usize>> {
        let mut solutions = self.run(1);
        solutions.pop()
    }

    /// Enumerate solutions until `max_count` have been found or the space
    /// is exhausted.
    ///
    /// Each solution is the set of matrix row indices whose rows together
    /// hit every column exactly once, in discovery order.
    pub fn solve_all(&mut self, max_count: usize) -> Vec<Vec<usize>> {
        self.run(max_count)
    }

    /// Count solutions, stopping at `max_count`.
    pub fn count_solutions(&mut self, max_count: usize) -> usize {
        self.run(max_count).len()
    }

    fn run(&mut self, max_count: usize) -> Vec<Vec<usize>> {
        if self.timed_out || max_count == 0 {
            return Vec::new();
        }

        let mut solutions = Vec::new();
        let mut stack = Vec::new();
        self.entries_since_check = 0;
        self.search(max_count, &mut stack, &mut solutions);

        log::trace!(
            "Search finished: {} solution(s), timed_out = {}.",
            solutions.len(),
            self.timed_out
        );
        solutions
    }

    fn search(
        &mut self,
        max_count: usize,
        stack: &mut Vec<usize>,
        solutions: &mut Vec<Vec<usize>>,
    ) {
        self.entries_since_check += 1;
        if self.entries_since_check >= RECURSION_CHECK_INTERVAL {
            self.entries_since_check = 0;
            if let Some(deadline) = self.deadline {
                if deadline.expired() {
                    self.timed_out = true;
                    return;
                }
            }
        }

        let header = match self.grid.min_size_header() {
            None => {
                // No uncovered column left: the stack is a solution.
                solutions.push(stack.clone());
                return;
            }
            Some(header) => header,
        };
        if self.grid.size(header) == 0 {
            return;
        }

        self.grid.cover(header);

        let mut row_node = self.grid.down(header);
        while row_node != header {
            if self.timed_out {
                break;
            }

            stack.push(self.grid.row_of(row_node));
            let mut node = self.grid.right(row_node);
            while node != row_node {
                let other = self.grid.header_of(node);
                self.grid.cover(other);
                node = self.grid.right(node);
            }

            self.search(max_count, stack, solutions);

            // Uncover in reverse cover order to restore the structure.
            let mut node = self.grid.left(row_node);
            while node != row_node {
                let other = self.grid.header_of(node);
                self.grid.uncover(other);
                node = self.grid.left(node);
            }
            stack.pop();

            if solutions.len() >= max_count {
                break;
            }

            row_node = self.grid.down(row_node);
        }

        self.grid.uncover(header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::shape::Shape;

    /// Build a solver straight from dense bool rows; the solver itself only
    /// ever sees (column count, sparse rows), so tests can skip the board
    /// and shape machinery.
    fn solver_from_rows(num_columns: usize, rows: &[&[bool]], deadline: Option<Deadline>) -> Solver {
        let sparse: Vec<Vec<usize>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(col, &set)| set.then_some(col))
                    .collect()
            })
            .collect();
        Solver::from_rows(num_columns, &sparse, deadline)
    }

    fn knuth_rows() -> Vec<Vec<bool>> {
        [
            [false, false, true, false, true, true, false],
            [true, false, false, true, false, false, true],
            [false, true, true, false, false, true, false],
            [true, false, false, true, false, false, false],
            [false, true, false, false, false, false, true],
            [false, false, false, true, true, false, true],
        ]
        .iter()
        .map(|row| row.to_vec())
        .collect()
    }

    #[test]
    fn solves_the_knuth_paper_example() {
        let rows = knuth_rows();
        let borrowed: Vec<&[bool]> = rows.iter().map(|r| r.as_slice()).collect();
        let mut solver = solver_from_rows(7, &borrowed, None);

        let solutions = solver.solve_all(usize::MAX);
        assert_eq!(solutions.len(), 1);
        let mut solution = solutions[0].clone();
        solution.sort_unstable();
        assert_eq!(solution, vec![0, 3, 4]);
    }

    #[test]
    fn every_solution_covers_each_column_exactly_once() {
        let rows = knuth_rows();
        let borrowed: Vec<&[bool]> = rows.iter().map(|r| r.as_slice()).collect();
        let mut solver = solver_from_rows(7, &borrowed, None);

        for solution in solver.solve_all(usize::MAX) {
            let mut column_counts = [0usize; 7];
            for &row_index in &solution {
                for (col, &set) in rows[row_index].iter().enumerate() {
                    if set {
                        column_counts[col] += 1;
                    }
                }
            }
            assert_eq!(column_counts, [1; 7]);
        }
    }

    #[test]
    fn enumeration_matches_brute_force_on_all_four_column_instances() {
        // Every 4-row, 4-column 0/1 matrix, encoded as a u16: one nibble
        // per row. Rows that would be all-zero never reach the solver.
        for seed in 1u16..=u16::MAX {
            let rows: Vec<u16> = (0..4).map(|i| (seed >> (i * 4)) & 0b1111).collect();
            if rows.iter().any(|&row| row == 0) {
                continue;
            }

            let brute_force = (0u32..16)
                .filter(|mask| {
                    let mut or = 0u16;
                    let mut ones = 0u32;
                    for (i, &row) in rows.iter().enumerate() {
                        if mask & (1 << i) != 0 {
                            or |= row;
                            ones += row.count_ones();
                        }
                    }
                    or == 0b1111 && ones == 4
                })
                .count();

            let dense: Vec<Vec<bool>> = rows
                .iter()
                .map(|&row| (0..4).map(|col| row & (1 << col) != 0).collect())
                .collect();
            let borrowed: Vec<&[bool]> = dense.iter().map(|r| r.as_slice()).collect();
            let mut solver = solver_from_rows(4, &borrowed, None);

            assert_eq!(
                solver.count_solutions(usize::MAX),
                brute_force,
                "seed {:#06x}",
                seed
            );
        }
    }

    #[test]
    fn solve_first_short_circuits() {
        let mut board = Board::new(1, 2);
        board.set_target(vec![true, true]);
        let matrix = CoverMatrix::build(&board, &[Shape::from_rows(&["#"]), Shape::from_rows(&["#"])], None);
        let mut solver = Solver::new(&matrix, None);

        // Two dots on two cells: two solutions exist, one is returned.
        assert!(solver.solve_first().is_some());
        let mut fresh = Solver::new(&matrix, None);
        assert_eq!(fresh.count_solutions(usize::MAX), 2);
    }

    #[test]
    fn max_count_bounds_enumeration() {
        let board = Board::new(1, 2);
        let matrix = CoverMatrix::build(
            &board,
            &[Shape::from_rows(&["#"]), Shape::from_rows(&["#"])],
            None,
        );
        let mut solver = Solver::new(&matrix, None);
        assert_eq!(solver.solve_all(1).len(), 1);
    }

    #[test]
    fn expired_deadline_times_out_without_solutions() {
        let board = Board::new(3, 3);
        let shapes: Vec<Shape> = (0..3).map(|_| Shape::from_rows(&["#"])).collect();
        let matrix = CoverMatrix::build(&board, &shapes, None);
        let mut solver = Solver::new(&matrix, Some(Deadline::now()));

        let solutions = solver.solve_all(usize::MAX);
        assert!(solver.timed_out());
        assert!(solutions.is_empty());
    }

    #[test]
    #[should_panic(expected = "Cover matrix must have at least one row.")]
    fn zero_row_matrix_is_rejected() {
        let board = Board::new(1, 1);
        let matrix = CoverMatrix::build(&board, &[Shape::from_rows(&["##"])], None);
        let _solver = Solver::new(&matrix, None);
    }

    #[test]
    fn deterministic_across_runs() {
        let rows = knuth_rows();
        let borrowed: Vec<&[bool]> = rows.iter().map(|r| r.as_slice()).collect();

        let first = solver_from_rows(7, &borrowed, None).solve_all(usize::MAX);
        let second = solver_from_rows(7, &borrowed, None).solve_all(usize::MAX);
        assert_eq!(first, second);
    }
}
