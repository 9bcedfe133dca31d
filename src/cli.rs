//! Command-line interface for gridmatch.

use clap::{Parser, Subcommand};
use gridmatch::Difficulty;

/// Gridmatch - tic-tac-toe in the terminal
#[derive(Parser, Debug)]
#[command(name = "gridmatch")]
#[command(about = "Two-player tic-tac-toe, locally or against the computer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play human-vs-human on this terminal
    Local,

    /// Play against the computer
    Ai {
        /// Opponent strength
        #[arg(short, long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,

        /// Computer "thinking" delay in milliseconds
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },
}
