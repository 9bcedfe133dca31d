//! Computer opponent strategies: random, one-ply tactical, and full minimax.

use crate::board::{Board, Mark, Square, WIN_LINES};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Strength of the computer opponent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Uniform-random legal move.
    Easy,
    /// Win if possible, block if necessary, prefer center, else random.
    #[default]
    Medium,
    /// Exhaustive minimax; never loses.
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Picks the computer's move for the given difficulty.
///
/// # Panics
///
/// Panics if the board is full. Strategies require at least one legal move;
/// invoking them on a finished board is a caller bug.
#[instrument(level = "debug", skip(board))]
pub fn choose_move(board: &Board, computer: Mark, difficulty: Difficulty) -> usize {
    assert!(!board.is_full(), "no legal moves: board is full");
    let index = match difficulty {
        Difficulty::Easy => random_move(board),
        Difficulty::Medium => tactical_move(board, computer),
        Difficulty::Hard => minimax_move(board, computer),
    };
    debug!(index, ?difficulty, "Computer chose move");
    index
}

/// Uniform-random choice among the empty cells.
fn random_move(board: &Board) -> usize {
    let open = board.empty_cells();
    open[fastrand::usize(..open.len())]
}

/// One-ply heuristic: complete own line, block the opponent's, take the
/// center, otherwise play randomly.
///
/// Tie-break is the fixed priority order above; within a priority, the
/// first qualifying line in [`WIN_LINES`] enumeration order wins.
fn tactical_move(board: &Board, computer: Mark) -> usize {
    if let Some(index) = completing_move(board, computer) {
        return index;
    }
    if let Some(index) = completing_move(board, computer.opponent()) {
        return index;
    }
    if board.is_empty(4) {
        return 4;
    }
    random_move(board)
}

/// Finds the empty cell that would complete a line for `mark`, if any.
///
/// Scans the 8 lines in their fixed order and returns the first line
/// holding exactly two of `mark` and one empty cell.
fn completing_move(board: &Board, mark: Mark) -> Option<usize> {
    for line in WIN_LINES {
        let mut filled = 0;
        let mut open = None;
        for index in line {
            match board.get(index) {
                Some(Square::Occupied(m)) if m == mark => filled += 1,
                Some(Square::Empty) => open = Some(index),
                _ => {}
            }
        }
        if filled == 2 {
            if let Some(index) = open {
                return Some(index);
            }
        }
    }
    None
}

/// Root of the exhaustive search: the lowest-index move maximizing the
/// minimax score. Later equal scores never replace an earlier choice.
fn minimax_move(board: &Board, computer: Mark) -> usize {
    let mut best_score = i32::MIN;
    let mut best = None;
    for index in 0..9 {
        if !board.is_empty(index) {
            continue;
        }
        let next = board
            .apply_move(index, computer)
            .expect("empty cell accepts a move");
        let score = minimax(&next, computer, false);
        if score > best_score {
            best_score = score;
            best = Some(index);
        }
    }
    best.expect("at least one legal move")
}

/// Unpruned minimax over the remaining game tree.
///
/// Terminal scores: +1 when the computer has won, -1 when the human has,
/// 0 on a draw. Max node when the computer is to move, min otherwise.
fn minimax(board: &Board, computer: Mark, computer_to_move: bool) -> i32 {
    if let Some(winner) = board.winner() {
        return if winner == computer { 1 } else { -1 };
    }
    if board.is_full() {
        return 0;
    }

    let mover = if computer_to_move {
        computer
    } else {
        computer.opponent()
    };
    let mut best = if computer_to_move { i32::MIN } else { i32::MAX };
    for index in 0..9 {
        if !board.is_empty(index) {
            continue;
        }
        let next = board
            .apply_move(index, mover)
            .expect("empty cell accepts a move");
        let score = minimax(&next, computer, !computer_to_move);
        best = if computer_to_move {
            best.max(score)
        } else {
            best.min(score)
        };
    }
    best
}
