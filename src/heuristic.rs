//! Static evaluation of non-terminal positions

use crate::{
    bitboard::{column_bits, detect_win},
    HEIGHT, WIDTH,
};

/// Position score from RED's point of view, positive values favour RED
pub type Score = i32;

/// Score of a position where RED has four in a row, YELLOW wins score `-WIN_SCORE`
///
/// No heuristic total can reach this magnitude.
pub const WIN_SCORE: Score = 9_999_999;
/// Score of a full board with no winner
pub const DRAW_SCORE: Score = 0;

/// Bonus for a line holding three pieces of one color and one empty cell
pub const THREE_BONUS: Score = 10_000;
/// Bonus for a line holding two pieces of one color and two empty cells
pub const TWO_BONUS: Score = 100;
/// Bonus for each piece in the center column
pub const CENTER_BONUS: Score = 10;

const CENTER_COLUMN: usize = WIDTH / 2;

const NUM_WINDOWS: usize =
    // horizontal
    (WIDTH - 3) * HEIGHT
    // vertical
    + WIDTH * (HEIGHT - 3)
    // both diagonals
    + 2 * (WIDTH - 3) * (HEIGHT - 3);

const fn window(start: usize, step: usize) -> u64 {
    let mut mask = 0;
    let mut i = 0;
    while i < 4 {
        mask |= 1 << (start + i * step);
        i += 1;
    }
    mask
}

/// Every four-cell line on the board
const fn window_masks() -> [u64; NUM_WINDOWS] {
    let mut masks = [0; NUM_WINDOWS];
    let mut n = 0;
    let mut column = 0;
    while column < WIDTH {
        let mut row = 0;
        while row < HEIGHT {
            let start = column * (HEIGHT + 1) + row;
            // horizontal
            if column + 3 < WIDTH {
                masks[n] = window(start, HEIGHT + 1);
                n += 1;
            }
            // vertical
            if row + 3 < HEIGHT {
                masks[n] = window(start, 1);
                n += 1;
            }
            // diagonal /
            if column + 3 < WIDTH && row + 3 < HEIGHT {
                masks[n] = window(start, HEIGHT + 2);
                n += 1;
            }
            // diagonal \
            if column + 3 < WIDTH && row >= 3 {
                masks[n] = window(start, HEIGHT);
                n += 1;
            }
            row += 1;
        }
        column += 1;
    }
    masks
}

const WINDOWS: [u64; NUM_WINDOWS] = window_masks();

/// Scores a pair of boards from RED's point of view
///
/// A completed four returns `WIN_SCORE` or `-WIN_SCORE` before any heuristic
/// work is done. Otherwise every line with pieces of only one color adds
/// [`THREE_BONUS`] or [`TWO_BONUS`] to that color, and each center column
/// piece adds [`CENTER_BONUS`].
pub fn evaluate(red: u64, yellow: u64) -> Score {
    if detect_win(red) {
        return WIN_SCORE;
    }
    if detect_win(yellow) {
        return -WIN_SCORE;
    }

    let mut score: Score = 0;
    for &window in WINDOWS.iter() {
        match ((red & window).count_ones(), (yellow & window).count_ones()) {
            (3, 0) => score += THREE_BONUS,
            (2, 0) => score += TWO_BONUS,
            (0, 3) => score -= THREE_BONUS,
            (0, 2) => score -= TWO_BONUS,
            // mixed lines can never be completed
            _ => {}
        }
    }

    score += column_bits(red, CENTER_COLUMN).count_ones() as Score * CENTER_BONUS;
    score -= column_bits(yellow, CENTER_COLUMN).count_ones() as Score * CENTER_BONUS;

    score.clamp(-WIN_SCORE, WIN_SCORE)
}
