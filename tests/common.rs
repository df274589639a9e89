use nonomino::{Board, Shape};

/// Build a shape from one string per row, `'#'` = filled, `'.'` = empty.
#[allow(dead_code)]
pub fn shape(rows: &[&str]) -> Shape {
    Shape::from_rows(rows)
}

/// Build a board whose target covers every cell.
#[allow(dead_code)]
pub fn full_board(rows: usize, cols: usize) -> Board {
    Board::with_target(rows, cols, vec![true; rows * cols])
}

/// Build a board with a target parsed from one string per row, `'#'` =
/// target cell, `'.'` = hole.
///
/// # Panics
///  - If `rows` is empty or the rows have unequal widths.
#[allow(dead_code)]
pub fn board_with_target(rows: &[&str]) -> Board {
    assert!(!rows.is_empty(), "Board needs at least one row.");
    let cols = rows[0].len();

    let mut target = Vec::with_capacity(rows.len() * cols);
    for row in rows {
        assert_eq!(row.len(), cols, "Board rows should all have the same width.");
        for c in row.chars() {
            target.push(c == '#');
        }
    }

    Board::with_target(rows.len(), cols, target)
}
