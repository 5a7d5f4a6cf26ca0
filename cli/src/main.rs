use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use solitaire_core::{
    BOARD_SIZE, Board, ClickOutcome, GameSession, PlayerId, PlayerProfile, Position,
    hint, solve,
};
use solitaire_protocol::{LeaderboardResponse, SubmitStatus};
use solitaire_worker::{MemoryStore, OptimisticStore, ScoreService, WorkerConfig};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Worker settings as a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the leaderboard is kept between runs
    #[arg(short, long, default_value = "leaderboard.json")]
    leaderboard: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game on the terminal and submit the result
    Play {
        #[arg(long, default_value_t = 1)]
        player_id: u64,

        #[arg(short, long, default_value = "Player")]
        name: String,
    },
    /// Print a winning line from the starting position
    Solve,
    /// Print the leaderboard
    Leaderboard,
}

type Service = ScoreService<OptimisticStore<MemoryStore>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            WorkerConfig::from_json(&raw)?
        }
        None => WorkerConfig::default(),
    };
    log::debug!("config: {config:?}");

    match args.command {
        Command::Play { player_id, name } => {
            let profile = PlayerProfile {
                player_id: PlayerId(player_id),
                username: None,
                display_name: name,
            };
            let service = open_service(&args.leaderboard, config)?;
            play(&service, &profile).await?;
            save_leaderboard(&service, &args.leaderboard)?;
        }
        Command::Solve => {
            let moves = solve(&Board::new()).context("the starting position has no solution")?;
            for (n, mv) in moves.iter().enumerate() {
                println!("{:2}. {mv}", n + 1);
            }
        }
        Command::Leaderboard => {
            let service = open_service(&args.leaderboard, config)?;
            print_leaderboard(&service.leaderboard().await?);
        }
    }
    Ok(())
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Loads the leaderboard file into an in-memory store.
///
/// The file is single-user: it is read whole here and written whole by
/// [`save_leaderboard`], so two concurrent runs overwrite each other.
fn open_service(path: &Path, config: WorkerConfig) -> anyhow::Result<Service> {
    let store = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading leaderboard {}", path.display()))?;
        MemoryStore::with_value(&config.leaderboard_key, raw)
    } else {
        MemoryStore::new()
    };
    let store = OptimisticStore::new(store, config.max_attempts);
    Ok(ScoreService::new(store, config))
}

fn save_leaderboard(service: &Service, path: &Path) -> anyhow::Result<()> {
    let key = &service.config().leaderboard_key;
    if let Some(raw) = service.store().inner().snapshot(key) {
        fs::write(path, raw).with_context(|| format!("writing leaderboard {}", path.display()))?;
        log::debug!("Leaderboard written to {}", path.display());
    }
    Ok(())
}

const HELP: &str = "\
commands:
  <row> <col>  select a peg, or jump the selected peg to an empty cell
  hint         suggest a move that still leads to a win
  auto         play the suggested move
  reset        start over
  quit         leave without submitting";

async fn play(service: &Service, profile: &PlayerProfile) -> anyhow::Result<()> {
    let mut session = GameSession::new();
    println!("{HELP}\n");
    print_board(&session);

    let mut lines = io::stdin().lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            return Ok(());
        };

        match line.trim() {
            "" => continue,
            "quit" | "q" => return Ok(()),
            "help" | "?" => println!("{HELP}"),
            "reset" => {
                session.reset();
                print_board(&session);
            }
            "hint" => match hint(session.board()) {
                Some(mv) => println!("try {mv}"),
                None => println!("no winning line from here"),
            },
            "auto" => match hint(session.board()) {
                Some(mv) => {
                    session.play(mv, Utc::now())?;
                    println!("played {mv}");
                    print_board(&session);
                }
                None => println!("no winning line from here"),
            },
            input => {
                let Some(pos) = parse_position(input) else {
                    println!("expected `<row> <col>`, `help` for more");
                    continue;
                };
                match session.click(pos, Utc::now()) {
                    Ok(ClickOutcome::Selected { origin, moves }) if moves.is_empty() => {
                        println!("{origin} has no jump");
                    }
                    Ok(ClickOutcome::Selected { .. } | ClickOutcome::Moved { .. }) => {
                        print_board(&session);
                    }
                    Ok(ClickOutcome::Deselected) => println!("selection cleared"),
                    Ok(ClickOutcome::Ignored) => {}
                    Err(err) => println!("{err}"),
                }
            }
        }

        if let Some(result) = session.take_result(Utc::now()) {
            println!(
                "{:?} with {} peg(s) left after {} moves in {}s",
                result.state, result.pegs_remaining, result.move_count, result.elapsed_secs
            );
            let response = service.submit_result(profile, &result, Utc::now()).await?;
            match (response.message, response.rank) {
                (SubmitStatus::Saved, Some(rank)) => println!("Score saved at #{}", rank + 1),
                (SubmitStatus::Saved, None) => println!("Score saved, outside the top ten"),
                (SubmitStatus::NotBetter, _) => println!("Score not better than your best"),
            }
            print_leaderboard(&LeaderboardResponse {
                leaderboard: response.leaderboard,
            });
            return Ok(());
        }
    }
}

fn parse_position(input: &str) -> Option<Position> {
    let mut parts = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    match parts.next() {
        Some(_) => None,
        None => Some(Position::new(row, col)),
    }
}

/// Board symbol of `pos`, with the selected peg and its landing cells marked.
fn cell_symbol(session: &GameSession, pos: Position) -> char {
    if session.selected() == Some(pos) {
        '@'
    } else if session
        .selected_moves()
        .iter()
        .any(|mv| mv.destination == pos)
    {
        '*'
    } else {
        session.board()[pos].to_char()
    }
}

fn print_board(session: &GameSession) {
    print!("  ");
    for col in 0..BOARD_SIZE {
        print!(" {col}");
    }
    println!();
    for row in 0..BOARD_SIZE {
        print!("{row} ");
        for col in 0..BOARD_SIZE {
            print!(" {}", cell_symbol(session, Position::new(row, col)));
        }
        println!();
    }
    println!(
        "{} pegs, {} moves, {}s",
        session.pegs_remaining(),
        session.move_count(),
        session.elapsed_secs(Utc::now())
    );
}

fn print_leaderboard(response: &LeaderboardResponse) {
    if response.leaderboard.is_empty() {
        println!("The leaderboard is empty");
        return;
    }
    for (rank, entry) in response.leaderboard.iter().enumerate() {
        println!(
            "{:2}. {:<20} {:>5}s  {} peg(s)  {}",
            rank + 1,
            entry.display_name,
            entry.time_seconds,
            entry.pegs_remaining,
            entry.timestamp.format("%Y-%m-%d"),
        );
    }
}
