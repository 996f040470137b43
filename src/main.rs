use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use std::io::{stdout, Write};
use std::time::Instant;

use connect4_engine::{
    bitboard::bit_index, Position, ReplacementPolicy, Solver, TranspositionTable, Zobrist, HEIGHT,
    WIDTH,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Finds the best Connect 4 move for a position with a depth-limited search"
)]
struct Cli {
    /// moves played so far, one column digit (0-6) per move
    moves: String,

    /// search depth in plies
    depth: u32,

    /// number of iterative deepening workers sharing one table
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// search each root move on its own task, ignores --threads
    #[arg(long)]
    root_split: bool,

    /// never replace a table entry once written
    #[arg(long)]
    first_writer_wins: bool,

    /// seed for the Zobrist table, random by default
    #[arg(long)]
    seed: Option<u64>,

    /// don't draw the board
    #[arg(long, short)]
    quiet: bool,
}

fn display(position: &Position) -> Result<()> {
    let mut stdout = stdout();

    let cols: String = (0..WIDTH).map(|x| x.to_string()).collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;

    for row in (0..HEIGHT).rev() {
        for column in 0..WIDTH {
            let cell: u64 = 1 << bit_index(row, column);
            stdout.queue(PrintStyledContent(
                style("O")
                    .attribute(Attribute::Bold)
                    .on(Color::DarkBlue)
                    .with(if position.red() & cell != 0 {
                        Color::Red
                    } else if position.yellow() & cell != 0 {
                        Color::Yellow
                    } else {
                        Color::DarkBlue
                    }),
            ))?;
        }
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    if cli.depth == 0 {
        bail!("search depth must be at least 1");
    }

    let zobrist = match cli.seed {
        Some(seed) => Zobrist::with_seed(seed),
        None => Zobrist::new(),
    };
    let position = Position::from_moves(&zobrist, cli.moves.trim())
        .with_context(|| format!("invalid move sequence '{}'", cli.moves))?;

    if !cli.quiet {
        display(&position)?;
    }

    let policy = if cli.first_writer_wins {
        ReplacementPolicy::FirstWriterWins
    } else {
        ReplacementPolicy::ReplaceIfNotShallower
    };
    let solver =
        Solver::new_with_transposition_table(position, TranspositionTable::with_policy(policy));

    let start = Instant::now();
    let (score, best_move) = if cli.root_split {
        solver.solve_root_split(cli.depth)
    } else if cli.threads > 1 {
        let progress = ProgressBar::new(cli.threads as u64 * cli.depth as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("Searching: {bar:40.cyan/blue} {pos}/{len} depths, {msg}")
                .progress_chars("█▓▒░  "),
        );
        let result = solver.solve_iterative_with(cli.depth, cli.threads, |_, depth, score| {
            progress.set_message(&format!("last depth {} scored {}", depth, score));
            progress.inc(1);
        });
        progress.finish_and_clear();
        result
    } else {
        solver.solve(cli.depth)
    };

    info!(
        "searched {} nodes in {:.3}s, score {}, {} table entries",
        solver.node_count(),
        start.elapsed().as_secs_f64(),
        score,
        solver.transposition_table().len()
    );

    match best_move {
        Some(column) => println!("{}", column),
        None => bail!("no move available, the game is already over"),
    }
    Ok(())
}
