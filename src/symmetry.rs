//! Left-right reflection of boards and moves across the center column
//!
//! Win detection and evaluation are both symmetric under this reflection, so a
//! position and its mirror have the same value and mirrored best moves.

use crate::{bitboard::Position, HEIGHT, WIDTH};

/// Mask of a whole 7-bit column block, sentinel bit included
const fn column_block(column: usize) -> u64 {
    ((1 << (HEIGHT + 1)) - 1) << (column * (HEIGHT + 1))
}

/// Reflects column `c` of a board onto column `6 - c`, keeping row order
pub fn mirror_board(board: u64) -> u64 {
    let mut mirrored = 0;
    for column in 0..WIDTH {
        let bits = board & column_block(column);
        let target = mirror_column(column);
        if target >= column {
            mirrored |= bits << ((target - column) * (HEIGHT + 1));
        } else {
            mirrored |= bits >> ((column - target) * (HEIGHT + 1));
        }
    }
    mirrored
}

#[inline]
pub fn mirror_column(column: usize) -> usize {
    WIDTH - 1 - column
}

/// Reflects a move, no move stays no move
#[inline]
pub fn mirror_move(column: Option<usize>) -> Option<usize> {
    column.map(mirror_column)
}

/// Builds the reflected position, with its hash recomputed from scratch
pub fn mirror_position<'z>(position: &Position<'z>) -> Position<'z> {
    Position::from_boards(
        position.zobrist(),
        mirror_board(position.red()),
        mirror_board(position.yellow()),
    )
    .with_last_move(mirror_move(position.last_move()))
}

/// Whether a position is its own mirror image
pub fn is_symmetric(position: &Position) -> bool {
    mirror_board(position.red()) == position.red()
        && mirror_board(position.yellow()) == position.yellow()
}
