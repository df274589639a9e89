//! Reduction of a (board, shape multiset) puzzle to an exact-cover matrix.
//!
//! Columns are the board's target cells in row-major order followed by one
//! slot column per input shape; rows are the valid placements of any
//! orientation of any shape. Solving the matrix with every column covered
//! exactly once is the same as tiling exactly the target.

use crate::board::Board;
use crate::shape::Shape;
use crate::solver::Deadline;

/// A single valid placement: which input shape, where its oriented bounding
/// rectangle's top-left corner sits, and the oriented copy itself.
///
/// The oriented shape is stored by value; it is the exact footprint the
/// matrix row was emitted from, which downstream consumers need when they
/// map a solution row back onto the board.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Index of the originating shape in the builder's input list.
    pub shape_index: usize,
    /// Top-left row of the oriented shape on the board.
    pub row: usize,
    /// Top-left column of the oriented shape on the board.
    pub col: usize,
    /// The oriented copy of the shape this placement uses.
    pub oriented: Shape,
}

/// The exact-cover matrix for one (board, shape list) instance, plus the
/// side tables needed to interpret its rows and columns.
#[derive(Debug)]
pub struct CoverMatrix {
    num_target_cells: usize,
    num_slots: usize,
    // sorted column indices per row
    rows: Vec<Vec<usize>>,
    placements: Vec<Placement>,
    // column index -> board cell
    cell_of_column: Vec<(usize, usize)>,
    duplicate_factor: u64,
    timed_out: bool,
}

impl CoverMatrix {
    /// Build the matrix for placing `shapes` (an ordered multiset) onto
    /// `board`'s target cells.
    ///
    /// A placement is valid iff every filled cell of the oriented shape
    /// lands on a target cell. If nothing fits the result simply has zero
    /// rows; callers must check [`is_empty`](CoverMatrix::is_empty) before
    /// handing the matrix to the solver.
    ///
    /// The deadline, if any, is checked every 100 emitted rows; on expiry
    /// construction stops early and [`timed_out`](CoverMatrix::timed_out)
    /// is set. A timed-out matrix must not be trusted.
    pub fn build(board: &Board, shapes: &[Shape], deadline: Option<Deadline>) -> Self {
        let mut cell_of_column = Vec::new();
        let mut column_of_cell = vec![usize::MAX; board.rows() * board.cols()];
        for row in 0..board.rows() {
            for col in 0..board.cols() {
                if board.is_target(row, col) {
                    column_of_cell[row * board.cols() + col] = cell_of_column.len();
                    cell_of_column.push((row, col));
                }
            }
        }
        let num_target_cells = cell_of_column.len();

        let mut matrix = CoverMatrix {
            num_target_cells,
            num_slots: shapes.len(),
            rows: Vec::new(),
            placements: Vec::new(),
            cell_of_column,
            duplicate_factor: duplicate_factor(shapes),
            timed_out: false,
        };

        'shapes: for (shape_index, shape) in shapes.iter().enumerate() {
            for oriented in shape.unique_rotations() {
                if oriented.rows() > board.rows() || oriented.cols() > board.cols() {
                    continue;
                }
                let cells = oriented.cells();
                for top in 0..=board.rows() - oriented.rows() {
                    for left in 0..=board.cols() - oriented.cols() {
                        let on_target = cells.iter().all(|&(dr, dc)| {
                            column_of_cell[(top + dr) * board.cols() + (left + dc)] != usize::MAX
                        });
                        if !on_target {
                            continue;
                        }

                        let mut columns: Vec<usize> = cells
                            .iter()
                            .map(|&(dr, dc)| {
                                column_of_cell[(top + dr) * board.cols() + (left + dc)]
                            })
                            .collect();
                        columns.sort_unstable();
                        columns.push(num_target_cells + shape_index);

                        matrix.rows.push(columns);
                        matrix.placements.push(Placement {
                            shape_index,
                            row: top,
                            col: left,
                            oriented: oriented.clone(),
                        });

                        if matrix.rows.len() % 100 == 0 {
                            if let Some(deadline) = deadline {
                                if deadline.expired() {
                                    matrix.timed_out = true;
                                    break 'shapes;
                                }
                            }
                        }
                    }
                }
            }
        }

        log::debug!(
            "Built cover matrix: {} rows, {} target cells, {} slots, duplicate factor {}.",
            matrix.rows.len(),
            matrix.num_target_cells,
            matrix.num_slots,
            matrix.duplicate_factor
        );

        matrix
    }

    /// Number of target-cell columns.
    pub fn num_target_cells(&self) -> usize {
        self.num_target_cells
    }

    /// Number of shape-slot columns (one per input shape).
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Total column count: target cells followed by shape slots.
    pub fn num_columns(&self) -> usize {
        self.num_target_cells + self.num_slots
    }

    /// Number of placement rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether no valid placement exists.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The sorted column indices of row `index`.
    ///
    /// # Panics
    ///  - If `index` is out of range.
    pub fn row(&self, index: usize) -> &[usize] {
        &self.rows[index]
    }

    /// All rows at once, for handing to the solver.
    pub(crate) fn sparse_rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// The placement record behind row `index`.
    ///
    /// # Panics
    ///  - If `index` is out of range.
    pub fn placement(&self, index: usize) -> &Placement {
        &self.placements[index]
    }

    /// The board cell a target-cell column stands for.
    ///
    /// # Panics
    ///  - If `column` is not a target-cell column.
    pub fn cell_of_column(&self, column: usize) -> (usize, usize) {
        assert!(
            column < self.num_target_cells,
            "Column [{}] is not a target-cell column.",
            column
        );
        self.cell_of_column[column]
    }

    /// The product of `k!` over groups of rotation-equivalent input shapes:
    /// how many permutations of one solution's slot assignment produce
    /// indistinguishable tilings.
    pub fn duplicate_factor(&self) -> u64 {
        self.duplicate_factor
    }

    /// Whether construction was cut short by the deadline.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

/// Partition `shapes` into classes under rotation equivalence and multiply
/// the factorials of the class sizes.
fn duplicate_factor(shapes: &[Shape]) -> u64 {
    let mut grouped = vec![false; shapes.len()];
    let mut factor = 1u64;
    for i in 0..shapes.len() {
        if grouped[i] {
            continue;
        }
        let mut class_size = 1u64;
        for j in (i + 1)..shapes.len() {
            if !grouped[j] && shapes[i].rotation_equivalent(&shapes[j]) {
                grouped[j] = true;
                class_size += 1;
            }
        }
        factor *= factorial(class_size);
    }
    factor
}

fn factorial(n: u64) -> u64 {
    (2..=n).product::<u64>().max(1)
}
