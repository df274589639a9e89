//! Polyomino shapes: rectangular boolean masks with a designated anchor
//! cell, quarter-turn rotations, and the equivalence relations the rest of
//! the solver is built on.

/// A polyomino shape, encoded as a row-major boolean mask over its bounding
/// rectangle together with an anchor cell.
///
/// The anchor is the cell the player "holds" while moving the shape, so a
/// rotation must map the anchor to the cell it visually becomes. Shapes are
/// immutable; rotation produces a fresh value.
///
/// The mask is not required to be connected, and a mask with no filled cell
/// is legal (if useless).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
    // row-major, rows * cols entries
    mask: Vec<bool>,
    anchor_row: usize,
    anchor_col: usize,
}

impl Shape {
    /// Create a shape with the anchor defaulted to the center of the
    /// bounding rectangle, `(rows / 2, cols / 2)`.
    ///
    /// # Panics
    ///  - If `rows` or `cols` is zero.
    ///  - If `mask.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, mask: Vec<bool>) -> Self {
        Self::with_anchor(rows, cols, mask, rows / 2, cols / 2)
    }

    /// Create a shape with an explicit anchor cell.
    ///
    /// # Panics
    ///  - If `rows` or `cols` is zero.
    ///  - If `mask.len() != rows * cols`.
    ///  - If the anchor lies outside the bounding rectangle.
    pub fn with_anchor(
        rows: usize,
        cols: usize,
        mask: Vec<bool>,
        anchor_row: usize,
        anchor_col: usize,
    ) -> Self {
        assert!(rows != 0 && cols != 0, "Shape dimensions must be non-zero.");
        assert!(
            mask.len() == rows * cols,
            "Mask with incorrect length [{}] for a {}x{} shape.",
            mask.len(),
            rows,
            cols
        );
        assert!(
            anchor_row < rows && anchor_col < cols,
            "Anchor should be inside the shape bounds [{:?}].",
            (anchor_row, anchor_col)
        );

        Shape {
            rows,
            cols,
            mask,
            anchor_row,
            anchor_col,
        }
    }

    /// Parse a shape from one string per row, `'#'` = filled, `'.'` = empty.
    ///
    /// This is the same cell encoding the `.level` container uses. The
    /// anchor defaults to the rectangle center.
    ///
    /// # Panics
    ///  - If `lines` is empty, any line is empty, the lines have unequal
    ///    lengths, or a character other than `'#'` / `'.'` appears.
    pub fn from_rows(lines: &[&str]) -> Self {
        assert!(!lines.is_empty(), "Shape needs at least one row.");
        let cols = lines[0].len();

        let mut mask = Vec::with_capacity(lines.len() * cols);
        for line in lines {
            assert!(
                line.len() == cols,
                "Shape rows should all have the same width [{:?}].",
                line
            );
            for c in line.chars() {
                match c {
                    '#' => mask.push(true),
                    '.' => mask.push(false),
                    other => panic!("Unknown shape cell character [{:?}].", other),
                }
            }
        }

        Self::new(lines.len(), cols, mask)
    }

    /// Number of rows in the bounding rectangle.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns in the bounding rectangle.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The anchor cell as `(row, col)`.
    pub fn anchor(&self) -> (usize, usize) {
        (self.anchor_row, self.anchor_col)
    }

    /// Number of filled cells.
    pub fn cell_count(&self) -> usize {
        self.mask.iter().filter(|&&filled| filled).count()
    }

    /// Whether the cell at `(row, col)` is filled.
    ///
    /// # Panics
    ///  - If `(row, col)` is outside the bounding rectangle.
    pub fn filled(&self, row: usize, col: usize) -> bool {
        assert!(
            row < self.rows && col < self.cols,
            "Cell query out of shape bounds [{:?}].",
            (row, col)
        );
        self.mask[row * self.cols + col]
    }

    /// Filled cells as `(row, col)` pairs relative to the top-left corner,
    /// in row-major order.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(self.cell_count());
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.mask[row * self.cols + col] {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    /// Filled cells as offsets relative to the anchor, in row-major order.
    pub fn offsets(&self) -> Vec<(i32, i32)> {
        self.cells()
            .into_iter()
            .map(|(row, col)| {
                (
                    row as i32 - self.anchor_row as i32,
                    col as i32 - self.anchor_col as i32,
                )
            })
            .collect()
    }

    /// A copy of this shape rotated a quarter turn clockwise.
    ///
    /// The result has dimensions `cols x rows`; cell `(r, c)` moves to
    /// `(c, rows - 1 - r)`, and the anchor moves with it.
    pub fn rotated_cw(&self) -> Self {
        let mut mask = vec![false; self.mask.len()];
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.mask[row * self.cols + col] {
                    mask[col * self.rows + (self.rows - 1 - row)] = true;
                }
            }
        }

        Shape {
            rows: self.cols,
            cols: self.rows,
            mask,
            anchor_row: self.anchor_col,
            anchor_col: self.rows - 1 - self.anchor_row,
        }
    }

    /// A copy of this shape rotated a quarter turn counter-clockwise.
    ///
    /// Cell `(r, c)` moves to `(cols - 1 - c, r)`, and the anchor moves
    /// with it.
    pub fn rotated_ccw(&self) -> Self {
        let mut mask = vec![false; self.mask.len()];
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.mask[row * self.cols + col] {
                    mask[(self.cols - 1 - col) * self.rows + row] = true;
                }
            }
        }

        Shape {
            rows: self.cols,
            cols: self.rows,
            mask,
            anchor_row: self.cols - 1 - self.anchor_col,
            anchor_col: self.anchor_row,
        }
    }

    /// Whether `self` and `other` have the same dimensions and the same
    /// mask, ignoring anchors.
    pub fn structurally_equal(&self, other: &Shape) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.mask == other.mask
    }

    /// Whether some rotation of `self` is structurally equal to `other`.
    pub fn rotation_equivalent(&self, other: &Shape) -> bool {
        let mut current = self.clone();
        for _ in 0..4 {
            if current.structurally_equal(other) {
                return true;
            }
            current = current.rotated_cw();
        }
        false
    }

    /// The distinct rotations of this shape, deduplicated by structural
    /// equality.
    ///
    /// The zero-rotation baseline comes first and the remaining entries keep
    /// clockwise order, so the list has 1, 2, or 4 entries.
    pub fn unique_rotations(&self) -> Vec<Shape> {
        let mut rotations: Vec<Shape> = Vec::with_capacity(4);
        let mut current = self.clone();
        for _ in 0..4 {
            if !rotations
                .iter()
                .any(|seen| seen.structurally_equal(&current))
            {
                rotations.push(current.clone());
            }
            current = current.rotated_cw();
        }
        rotations
    }
}
