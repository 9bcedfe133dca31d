//! Gridmatch - terminal front end.
//!
//! Thin console implementation of the presentation adapter plus the event
//! loop feeding cell activations into the turn controller.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use gridmatch::{Board, Difficulty, GameUi, LocalGame, Phase, SoundKind};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Local => run_local(None).await,
        Command::Ai {
            difficulty,
            delay_ms,
        } => run_local(Some((difficulty, delay_ms))).await,
    }
}

/// Console implementation of the presentation adapter.
///
/// The game loop is synchronous, so the input lock only needs a log line;
/// no event can arrive while the computer is thinking.
#[derive(Debug, Default)]
struct ConsoleUi;

impl GameUi for ConsoleUi {
    fn render_board(&mut self, board: &Board) {
        println!("\n{}\n", board.display());
    }

    fn render_status(&mut self, text: &str) {
        println!("{text}");
    }

    fn lock_input(&mut self, locked: bool) {
        debug!(locked, "Input lock changed");
    }

    fn play_sound(&mut self, kind: SoundKind) {
        // No audio device on a plain terminal; announce the cue instead.
        let cue = match kind {
            SoundKind::Move => return,
            SoundKind::Win => "* victory *",
            SoundKind::Lose => "* defeat *",
            SoundKind::Draw => "* stalemate *",
        };
        println!("{cue}");
    }
}

/// Runs a local game loop, optionally seating the computer at O.
async fn run_local(computer: Option<(Difficulty, u64)>) -> Result<()> {
    let ui = ConsoleUi::default();
    let mut game = match computer {
        Some((difficulty, delay_ms)) => {
            info!(?difficulty, delay_ms, "Starting game against the computer");
            LocalGame::with_computer(ui, difficulty, Duration::from_millis(delay_ms))
        }
        None => {
            info!("Starting local two-player game");
            LocalGame::new(ui)
        }
    };
    game.start();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    while game.phase() == Phase::InProgress {
        print!("{} to move, pick a cell (0-8): ", game.current_player());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let Ok(index) = line.trim().parse::<usize>() else {
            println!("Enter a number between 0 and 8.");
            continue;
        };
        if game.handle_cell(index).await.is_err() {
            println!("That cell isn't available.");
        }
    }

    Ok(())
}
