//! Zobrist hashing of board positions

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{bitboard::Color, HEIGHT, WIDTH};

/// One random 64-bit value per (column, row, color) cell
///
/// The table is built once and never mutated afterwards. Positions borrow it
/// to keep their hash up to date as moves are played, so every position that
/// is compared or cached together must come from the same table.
#[derive(Clone)]
pub struct Zobrist {
    table: [[[u64; 2]; HEIGHT]; WIDTH],
}

impl Zobrist {
    /// Creates a table seeded from OS entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a reproducible table, mostly useful for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng<R: Rng>(mut rng: R) -> Self {
        let mut table = [[[0u64; 2]; HEIGHT]; WIDTH];
        for column in table.iter_mut() {
            for cell in column.iter_mut() {
                for value in cell.iter_mut() {
                    *value = rng.gen();
                }
            }
        }
        Self { table }
    }

    /// The constant for a single occupied cell
    #[inline]
    pub fn value(&self, column: usize, row: usize, color: Color) -> u64 {
        self.table[column][row][color.index()]
    }

    /// Computes the hash of a pair of boards from scratch
    pub fn hash(&self, red: u64, yellow: u64) -> u64 {
        let mut hash = 0;
        for column in 0..WIDTH {
            for row in 0..HEIGHT {
                let cell: u64 = 1 << (column * (HEIGHT + 1) + row);
                if red & cell != 0 {
                    hash ^= self.value(column, row, Color::Red);
                } else if yellow & cell != 0 {
                    hash ^= self.value(column, row, Color::Yellow);
                }
            }
        }
        hash
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Zobrist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zobrist").finish_non_exhaustive()
    }
}
