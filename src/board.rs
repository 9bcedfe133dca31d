//! Pure tic-tac-toe rules: board state, move legality, win and draw detection.

use derive_more::{Display, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals (row-major indices).
pub const WIN_LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Player X (moves first).
    X,
    /// Player O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A single cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Square {
    /// No mark placed yet.
    Empty,
    /// Occupied by a player's mark.
    Occupied(Mark),
}

// The shared record stores cells as "", "X", or "O", so the wire shape
// matches what a plain JSON client would write.
impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            Square::Empty => "",
            Square::Occupied(Mark::X) => "X",
            Square::Occupied(Mark::O) => "O",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "" => Ok(Square::Empty),
            "X" => Ok(Square::Occupied(Mark::X)),
            "O" => Ok(Square::Occupied(Mark::O)),
            other => Err(serde::de::Error::custom(format!(
                "invalid cell value: {other:?}"
            ))),
        }
    }
}

/// Error returned when a move targets an occupied or out-of-range cell.
///
/// The UI adapter is expected to pre-filter these, so seeing one outside
/// tests indicates a caller bug rather than a recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("invalid move: cell {index} is occupied or out of range")]
pub struct InvalidMove {
    /// The offending cell index.
    pub index: usize,
}

/// Terminal status of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Moves remain and nobody has three in a row.
    InProgress,
    /// The given mark completed a line.
    Won(Mark),
    /// All nine cells filled with no winner.
    Draw,
}

/// 3x3 tic-tac-toe board, cells in row-major order.
///
/// Serializes as a bare 9-element array of cell strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the cell at the given index (0-8).
    pub fn get(&self, index: usize) -> Option<Square> {
        self.squares.get(index).copied()
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Square::Empty))
    }

    /// Checks if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(|s| *s != Square::Empty)
    }

    /// Returns all cells as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Returns the indices of all empty cells, lowest first.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Square::Empty)
            .map(|(i, _)| i)
            .collect()
    }

    /// Places a mark, returning the resulting board.
    ///
    /// Pure: `self` is untouched. Fails with [`InvalidMove`] if the index is
    /// out of range or the cell is occupied.
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Board, InvalidMove> {
        if !self.is_empty(index) {
            return Err(InvalidMove { index });
        }
        let mut next = *self;
        next.squares[index] = Square::Occupied(mark);
        Ok(next)
    }

    /// Checks all 8 lines for a completed three-in-a-row.
    pub fn winner(&self) -> Option<Mark> {
        for [a, b, c] in WIN_LINES {
            let sq = self.squares[a];
            if sq != Square::Empty && sq == self.squares[b] && sq == self.squares[c] {
                return match sq {
                    Square::Occupied(mark) => Some(mark),
                    Square::Empty => None,
                };
            }
        }
        None
    }

    /// Derives the outcome purely from the cells.
    ///
    /// Works for a remote observer who does not know whose move just landed.
    #[instrument(level = "debug")]
    pub fn evaluate(&self) -> Outcome {
        if let Some(mark) = self.winner() {
            return Outcome::Won(mark);
        }
        if self.is_full() {
            return Outcome::Draw;
        }
        Outcome::InProgress
    }

    /// Formats the board as a human-readable 3x3 grid.
    ///
    /// Empty cells show their index so a console player can pick one.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let index = row * 3 + col;
                let symbol = match self.squares[index] {
                    Square::Empty => index.to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(cells: [&str; 9]) -> Board {
        let mut board = Board::new();
        for (i, cell) in cells.iter().enumerate() {
            board.squares[i] = match *cell {
                "X" => Square::Occupied(Mark::X),
                "O" => Square::Occupied(Mark::O),
                _ => Square::Empty,
            };
        }
        board
    }

    #[test]
    fn test_empty_board_in_progress() {
        assert_eq!(Board::new().evaluate(), Outcome::InProgress);
    }

    #[test]
    fn test_center_opening_in_progress() {
        let board = Board::new().apply_move(4, Mark::X).expect("empty center");
        assert_eq!(board.evaluate(), Outcome::InProgress);
    }

    #[test]
    fn test_top_row_win() {
        let board = board_from(["X", "X", "X", "", "O", "O", "", "", ""]);
        assert_eq!(board.evaluate(), Outcome::Won(Mark::X));
    }

    #[test]
    fn test_diagonal_win() {
        let board = board_from(["O", "X", "X", "", "O", "", "X", "", "O"]);
        assert_eq!(board.evaluate(), Outcome::Won(Mark::O));
    }

    #[test]
    fn test_full_board_draw() {
        let board = board_from(["X", "O", "X", "X", "O", "O", "O", "X", "X"]);
        assert_eq!(board.evaluate(), Outcome::Draw);
    }

    #[test]
    fn test_apply_move_occupied() {
        let board = Board::new().apply_move(4, Mark::X).unwrap();
        assert_eq!(board.apply_move(4, Mark::O), Err(InvalidMove { index: 4 }));
    }

    #[test]
    fn test_apply_move_out_of_range() {
        assert_eq!(
            Board::new().apply_move(9, Mark::X),
            Err(InvalidMove { index: 9 })
        );
    }

    #[test]
    fn test_apply_move_is_pure() {
        let board = Board::new();
        let _ = board.apply_move(0, Mark::X).unwrap();
        assert!(board.is_empty(0));
    }

    #[test]
    fn test_cell_wire_format() {
        let board = board_from(["X", "", "O", "", "", "", "", "", ""]);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X","","O","","","","","",""]"#);
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }
}
