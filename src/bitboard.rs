use anyhow::{anyhow, Result};
use smallvec::SmallVec;

use std::fmt;

use crate::{
    heuristic::{self, Score},
    zobrist::Zobrist,
    HEIGHT, WIDTH,
};

pub(crate) mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// Bit shifts that step to the next cell of a line: vertical, horizontal and both diagonals
const DIRECTIONS: [usize; 4] = [1, HEIGHT + 1, HEIGHT, HEIGHT + 2];

/// Returns an array ordering the columns from the middle outwards, as
/// the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (i % 2) * (i / 2 + 1) - (1 - i % 2) * (i / 2);
        i += 1;
    }
    move_order
}

const MOVE_ORDER: [usize; WIDTH] = move_order();

/// Child positions of a node, kept on the stack of the search frame that made them
pub type Children<'z> = SmallVec<[Position<'z>; WIDTH]>;

/// Piece color, RED always moves first
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Color {
    Red,
    Yellow,
}

impl Color {
    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Yellow => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Color::Red => Color::Yellow,
            Color::Yellow => Color::Red,
        }
    }
}

/// Bit index of a cell, each column reserves one sentinel bit above its top row
#[inline]
pub const fn bit_index(row: usize, column: usize) -> usize {
    column * (HEIGHT + 1) + row
}

/// The playable cells of one column of `board`, shifted down to the low bits
#[inline]
pub const fn column_bits(board: u64, column: usize) -> u64 {
    (board >> (column * (HEIGHT + 1))) & ((1 << HEIGHT) - 1)
}

/// Tests a single player's board for four in a row in any direction
pub fn detect_win(board: u64) -> bool {
    for &step in DIRECTIONS.iter() {
        // mark all runs of 2
        let m = board & (board >> step);
        // check for runs of 2 * (runs of 2)
        if m & (m >> (2 * step)) != 0 {
            return true;
        }
    }
    false
}

/// A connect four position stored as one bitboard per player
///
/// Bit `column * 7 + row` is set in `red` or `yellow` when that player owns the
/// cell. The Zobrist hash is maintained incrementally by [`Position::play_move`]
/// and [`Position::place_piece`], and always equals a from-scratch computation
/// over both boards.
#[derive(Copy, Clone)]
pub struct Position<'z> {
    red: u64,
    yellow: u64,
    hash: u64,
    last_move: Option<usize>,
    eval: Option<Score>,
    zobrist: &'z Zobrist,
}

impl<'z> Position<'z> {
    /// Creates an empty board
    pub fn new(zobrist: &'z Zobrist) -> Self {
        Self {
            red: 0,
            yellow: 0,
            hash: 0,
            last_move: None,
            eval: None,
            zobrist,
        }
    }

    /// Creates a position from raw boards, computing the hash from scratch
    pub fn from_boards(zobrist: &'z Zobrist, red: u64, yellow: u64) -> Self {
        debug_assert_eq!(red & yellow, 0, "a cell cannot hold both colors");
        let mut position = Self::new(zobrist);
        position.red = red;
        position.yellow = yellow;
        position.init_hash();
        position
    }

    /// Creates a position from a sequence of column digits `0..=6`
    pub fn from_moves<S: AsRef<str>>(zobrist: &'z Zobrist, moves: S) -> Result<Self> {
        let mut position = Self::new(zobrist);

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column < WIDTH => {
                    if !position.is_legal_move(column) {
                        return Err(anyhow!("Invalid move, column {} full", column));
                    }
                    position.play_move(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(position)
    }

    pub fn red(&self) -> u64 {
        self.red
    }

    pub fn yellow(&self) -> u64 {
        self.yellow
    }

    pub fn board_for(&self, color: Color) -> u64 {
        match color {
            Color::Red => self.red,
            Color::Yellow => self.yellow,
        }
    }

    /// Mask of all occupied cells
    pub fn occupied(&self) -> u64 {
        self.red | self.yellow
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The column of the move that produced this position, if any
    pub fn last_move(&self) -> Option<usize> {
        self.last_move
    }

    pub fn zobrist(&self) -> &'z Zobrist {
        self.zobrist
    }

    pub fn num_moves(&self) -> usize {
        self.occupied().count_ones() as usize
    }

    /// RED moves whenever both sides have the same number of pieces
    pub fn color_to_move(&self) -> Color {
        if self.red.count_ones() == self.yellow.count_ones() {
            Color::Red
        } else {
            Color::Yellow
        }
    }

    /// Recomputes the hash from scratch over both boards
    pub fn init_hash(&mut self) {
        self.hash = self.zobrist.hash(self.red, self.yellow);
    }

    /// Sets a cell directly, without checking that it is supported or that it is that color's turn
    pub fn place_piece(&mut self, row: usize, column: usize, color: Color) {
        let bit: u64 = 1 << bit_index(row, column);
        debug_assert!(
            self.board_for(color.opponent()) & bit == 0,
            "cell ({}, {}) already holds the other color",
            row,
            column
        );
        if self.board_for(color) & bit != 0 {
            return;
        }
        match color {
            Color::Red => self.red |= bit,
            Color::Yellow => self.yellow |= bit,
        }
        self.hash ^= self.zobrist.value(column, row, color);
        self.eval = None;
    }

    pub fn is_legal_move(&self, column: usize) -> bool {
        column < WIDTH && column_bits(self.occupied(), column).count_ones() < HEIGHT as u32
    }

    /// The lowest empty row of a column, or `None` if the column is full
    pub fn row_for_next_piece(&self, column: usize) -> Option<usize> {
        if column >= WIDTH {
            return None;
        }
        let stack = (self.occupied() >> (column * (HEIGHT + 1))) & ((1 << (HEIGHT + 1)) - 1);
        // the first clear bit sits directly above the stack
        let row = (!stack & ((1 << (HEIGHT + 1)) - 1)).trailing_zeros() as usize;
        if row >= HEIGHT {
            None
        } else {
            Some(row)
        }
    }

    /// Drops a piece of the side to move into `column`
    ///
    /// # Panics
    /// Panics if the column is full or out of range, callers must check
    /// [`Position::is_legal_move`] first.
    pub fn play_move(&mut self, column: usize) {
        let mover = self.color_to_move();
        let row = self
            .row_for_next_piece(column)
            .unwrap_or_else(|| panic!("illegal move: column {} is full or out of range", column));

        let bit: u64 = 1 << bit_index(row, column);
        match mover {
            Color::Red => self.red |= bit,
            Color::Yellow => self.yellow |= bit,
        }
        self.last_move = Some(column);
        self.hash ^= self.zobrist.value(column, row, mover);
        self.eval = None;
    }

    /// A copy of this position with one move applied
    pub fn child(&self, column: usize) -> Self {
        let mut next = *self;
        next.play_move(column);
        next
    }

    /// Legal columns in center-out order
    pub fn legal_moves(&self) -> impl Iterator<Item = usize> {
        let occupied = self.occupied();
        MOVE_ORDER
            .into_iter()
            .filter(move |&column| column_bits(occupied, column).count_ones() < HEIGHT as u32)
    }

    /// Every legal child in center-out order
    ///
    /// `preferred_first_move` is tried first when it names a legal column.
    pub fn children(&self, preferred_first_move: Option<usize>) -> Children<'z> {
        let mut children = Children::new();

        let preferred = preferred_first_move.filter(|&column| self.is_legal_move(column));
        if let Some(column) = preferred {
            children.push(self.child(column));
        }
        for &column in MOVE_ORDER.iter() {
            if Some(column) != preferred && self.is_legal_move(column) {
                children.push(self.child(column));
            }
        }
        children
    }

    /// The player with four in a row, if any
    pub fn winner(&self) -> Option<Color> {
        if detect_win(self.red) {
            Some(Color::Red)
        } else if detect_win(self.yellow) {
            Some(Color::Yellow)
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == static_masks::full_board_mask()
    }

    /// Static evaluation from RED's point of view, computed on first use
    pub fn eval(&mut self) -> Score {
        if let Some(eval) = self.eval {
            return eval;
        }
        let eval = heuristic::evaluate(self.red, self.yellow);
        self.eval = Some(eval);
        eval
    }

    pub(crate) fn with_last_move(mut self, last_move: Option<usize>) -> Self {
        self.last_move = last_move;
        self
    }
}

impl PartialEq for Position<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.red == other.red && self.yellow == other.yellow
    }
}

impl Eq for Position<'_> {}

impl fmt::Debug for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("red", &format_args!("{:#x}", self.red))
            .field("yellow", &format_args!("{:#x}", self.yellow))
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("last_move", &self.last_move)
            .finish()
    }
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let cell: u64 = 1 << bit_index(row, column);
                let symbol = if self.red & cell != 0 {
                    'R'
                } else if self.yellow & cell != 0 {
                    'Y'
                } else {
                    '.'
                };
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
