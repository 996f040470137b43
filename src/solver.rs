//! A depth-limited alpha-beta search for Connect 4

use log::debug;
use rayon::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::{
    bitboard::{Color, Position},
    heuristic::{self, Score, DRAW_SCORE, WIN_SCORE},
    symmetry::mirror_position,
    transposition_table::{Bound, TTEntry, TranspositionTable},
};

/// Lower edge of the root search window, below every attainable score
pub const MIN_WINDOW: Score = -WIN_SCORE - 1;
/// Upper edge of the root search window, above every attainable score
pub const MAX_WINDOW: Score = WIN_SCORE + 1;

/// An agent that searches Connect 4 positions to a fixed depth
///
/// # Notes
/// RED maximizes and YELLOW minimizes the heuristic score (see
/// [`crate::heuristic::evaluate`]). Results are cached in a
/// [`TranspositionTable`] for both a position and its mirror image, and the
/// best move at the root is read back from the root's table entry after the
/// search completes.
///
/// The table can be shared between solvers, either across successive moves
/// of a game or between worker threads searching the same position.
pub struct Solver<'z> {
    position: Position<'z>,
    transposition_table: TranspositionTable,
    node_count: AtomicUsize,
}

impl<'z> Solver<'z> {
    /// Creates a new `Solver` with an empty transposition table
    pub fn new(position: Position<'z>) -> Self {
        Self::new_with_transposition_table(position, TranspositionTable::new())
    }

    /// Creates a new `Solver` with a given transposition table
    pub fn new_with_transposition_table(
        position: Position<'z>,
        transposition_table: TranspositionTable,
    ) -> Self {
        Self {
            position,
            transposition_table,
            node_count: AtomicUsize::new(0),
        }
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.transposition_table
    }

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub fn node_count(&self) -> usize {
        self.node_count.load(Ordering::Relaxed)
    }

    /// Performs game tree search
    ///
    /// Returns the minimax score of `position` searched `depth` plies deep
    /// within the window `[alpha, beta]`. A score at or below `alpha` is an
    /// upper bound of the true value and a score at or above `beta` is a lower
    /// bound, as with any fail-soft alpha-beta search.
    pub fn search(
        &self,
        position: Position<'z>,
        depth: u32,
        mut alpha: Score,
        mut beta: Score,
    ) -> Score {
        self.node_count.fetch_add(1, Ordering::Relaxed);

        // a colliding hash is ignored entirely, the subtree is just searched again
        let mirrored = mirror_position(&position);
        let cached = self
            .transposition_table
            .read_or_mirror(&position, &mirrored)
            .filter(|entry| entry.matches(&position));

        // only a deeper search can bound this one
        if let Some(entry) = cached.filter(|entry| entry.is_usable_for(&position, depth)) {
            match entry.flag {
                Bound::Exact => return entry.score,
                Bound::LowerBound => alpha = alpha.max(entry.score),
                Bound::UpperBound => beta = beta.min(entry.score),
            }
            if alpha >= beta {
                return entry.score;
            }
        }

        // a finished game is scored before the depth limit is considered
        if depth == 0 || position.is_terminal() {
            return heuristic::evaluate(position.red(), position.yellow());
        }

        // try the remembered best move first for earlier cutoffs
        let children = position.children(cached.and_then(|entry| entry.best_move));
        if children.is_empty() {
            return DRAW_SCORE;
        }

        let (window_alpha, window_beta) = (alpha, beta);
        let maximizing = position.color_to_move() == Color::Red;
        let mut best_score = if maximizing { MIN_WINDOW } else { MAX_WINDOW };
        let mut best_move = None;

        for child in children {
            let score = self.search(child, depth - 1, alpha, beta);
            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = child.last_move();
                }
                alpha = alpha.max(score);
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = child.last_move();
                }
                beta = beta.min(score);
            }
            // the opponent will never allow this line, skip the remaining siblings
            if beta <= alpha {
                break;
            }
        }

        let entry = TTEntry {
            red: position.red(),
            yellow: position.yellow(),
            depth,
            score: best_score,
            flag: Bound::classify(best_score, window_alpha, window_beta),
            best_move,
        };
        self.store(&position, &mirrored, entry);

        best_score
    }

    /// Writes an entry for a position and its mirror
    ///
    /// The mirror goes first so that a symmetric position, whose two hashes
    /// are equal, ends up with the entry in its own orientation. The root
    /// entry skips the replacement policy: it always holds the most recently
    /// completed root search, so its move and score belong together.
    fn store(&self, position: &Position<'z>, mirrored: &Position<'z>, entry: TTEntry) {
        self.transposition_table.write(mirrored.hash(), entry.mirrored());
        if *position == self.position {
            self.transposition_table.overwrite(position.hash(), entry);
        } else {
            self.transposition_table.write(position.hash(), entry);
        }
    }

    /// The table entry of the root position, if present
    fn root_entry(&self) -> Option<TTEntry> {
        self.transposition_table
            .read(self.position.hash())
            .filter(|entry| entry.matches(&self.position))
    }

    /// The best move stored for the root position, if its entry is present
    pub fn root_best_move(&self) -> Option<usize> {
        self.root_entry().and_then(|entry| entry.best_move)
    }

    /// Searches the root to `depth` and returns its score and best move
    ///
    /// The move is `None` when there is nothing to choose: a depth of zero, a
    /// game that is already won, or a full board.
    pub fn solve(&self, depth: u32) -> (Score, Option<usize>) {
        let score = self.search(self.position, depth, MIN_WINDOW, MAX_WINDOW);
        if depth == 0 {
            return (score, None);
        }
        (score, self.root_best_move())
    }

    /// The column to play after searching the root to `depth`
    pub fn best_move(&self, depth: u32) -> Option<usize> {
        self.solve(depth).1
    }

    /// Runs `threads` workers that each search the root at depths `1..=max_depth`
    ///
    /// The workers share this solver's transposition table, so work finished
    /// by one worker is available to the others.
    pub fn solve_iterative(&self, max_depth: u32, threads: usize) -> (Score, Option<usize>) {
        self.solve_iterative_with(max_depth, threads, |_, _, _| {})
    }

    /// Like [`Solver::solve_iterative`], calling `on_depth(worker, depth, score)`
    /// every time a worker completes a depth
    pub fn solve_iterative_with<F>(
        &self,
        max_depth: u32,
        threads: usize,
        on_depth: F,
    ) -> (Score, Option<usize>)
    where
        F: Fn(usize, u32, Score) + Sync,
    {
        if max_depth == 0 {
            return self.solve(0);
        }

        let on_depth = &on_depth;
        let scores: Vec<Score> = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads.max(1))
                .map(|worker| {
                    scope.spawn(move || {
                        let mut score = DRAW_SCORE;
                        for depth in 1..=max_depth {
                            score = self.search(self.position, depth, MIN_WINDOW, MAX_WINDOW);
                            debug!(
                                "worker {} completed depth {} with score {}",
                                worker, depth, score
                            );
                            on_depth(worker, depth, score);
                        }
                        score
                    })
                })
                .collect();

            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        // every worker's last root write is a max depth search
        match self.root_entry() {
            Some(entry) => (entry.score, entry.best_move),
            None => (scores[0], None),
        }
    }

    /// Searches every root move on its own task and keeps the best one
    ///
    /// Each subtree gets the full window, so every returned score is exact.
    /// The combined result is stored as the root's table entry.
    pub fn solve_root_split(&self, depth: u32) -> (Score, Option<usize>) {
        if depth == 0 || self.position.is_terminal() {
            return (self.search(self.position, depth, MIN_WINDOW, MAX_WINDOW), None);
        }

        let children: Vec<Position<'z>> = self.position.children(None).into_iter().collect();
        self.node_count.fetch_add(1, Ordering::Relaxed);

        let results: Vec<(Option<usize>, Score)> = children
            .par_iter()
            .map(|child| {
                let score = self.search(*child, depth - 1, MIN_WINDOW, MAX_WINDOW);
                debug!("root move {:?} scored {}", child.last_move(), score);
                (child.last_move(), score)
            })
            .collect();

        let maximizing = self.position.color_to_move() == Color::Red;
        let mut best: Option<(Option<usize>, Score)> = None;
        for &(column, score) in results.iter() {
            let better = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if better {
                best = Some((column, score));
            }
        }

        match best {
            Some((best_move, score)) => {
                let entry = TTEntry {
                    red: self.position.red(),
                    yellow: self.position.yellow(),
                    depth,
                    score,
                    flag: Bound::Exact,
                    best_move,
                };
                self.store(&self.position, &mirror_position(&self.position), entry);
                (score, best_move)
            }
            // full board
            None => (DRAW_SCORE, None),
        }
    }
}
