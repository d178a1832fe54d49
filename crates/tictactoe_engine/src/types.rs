//! Core board types for tic-tac-toe.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Number of rows on the board.
pub const BOARD_ROWS: usize = 3;

/// Number of columns on the board.
pub const BOARD_COLUMNS: usize = 3;

/// A game piece. X always moves first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, strum::EnumIter,
)]
pub enum Piece {
    /// The X piece.
    X,
    /// The O piece.
    O,
}

impl Piece {
    /// Returns the opposing piece.
    pub fn opponent(self) -> Self {
        match self {
            Piece::X => Piece::O,
            Piece::O => Piece::X,
        }
    }
}

/// A square on the board.
///
/// Serialized as `null` when empty and as the piece name when occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Piece>", into = "Option<Piece>")]
pub enum Square {
    /// Nothing placed here yet.
    #[default]
    Empty,
    /// Square holding a piece.
    Occupied(Piece),
}

impl Square {
    /// Returns the piece on this square, if any.
    pub fn piece(self) -> Option<Piece> {
        match self {
            Square::Empty => None,
            Square::Occupied(piece) => Some(piece),
        }
    }
}

impl From<Option<Piece>> for Square {
    fn from(piece: Option<Piece>) -> Self {
        piece.map_or(Square::Empty, Square::Occupied)
    }
}

impl From<Square> for Option<Piece> {
    fn from(square: Square) -> Self {
        square.piece()
    }
}

/// A location on the board, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("({row}, {column})")]
pub struct BoardPosition {
    /// Row, top to bottom.
    pub row: usize,
    /// Column, left to right.
    pub column: usize,
}

impl BoardPosition {
    /// Creates a new position. The position may be out of range.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Whether this position lies on the board.
    pub fn is_in_range(&self) -> bool {
        self.row < BOARD_ROWS && self.column < BOARD_COLUMNS
    }

    /// All nine positions in row-major order.
    pub fn all() -> impl Iterator<Item = BoardPosition> {
        (0..BOARD_ROWS).flat_map(|row| (0..BOARD_COLUMNS).map(move |column| Self::new(row, column)))
    }
}

/// 3x3 tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [[Square; BOARD_COLUMNS]; BOARD_ROWS],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position, `None` when out of range.
    pub fn get(&self, position: BoardPosition) -> Option<Square> {
        self.squares
            .get(position.row)
            .and_then(|row| row.get(position.column))
            .copied()
    }

    /// Checks if the square at the position exists and is empty.
    pub fn is_empty(&self, position: BoardPosition) -> bool {
        matches!(self.get(position), Some(Square::Empty))
    }

    /// Returns all squares, row-major.
    pub fn squares(&self) -> &[[Square; BOARD_COLUMNS]; BOARD_ROWS] {
        &self.squares
    }

    /// Number of squares holding the given piece.
    pub fn count(&self, piece: Piece) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|square| **square == Square::Occupied(piece))
            .count()
    }

    /// The piece that moves next: X whenever both pieces have been placed equally often.
    pub fn next_piece(&self) -> Piece {
        if self.count(Piece::X) == self.count(Piece::O) {
            Piece::X
        } else {
            Piece::O
        }
    }

    /// Whether every square is occupied.
    pub fn is_full(&self) -> bool {
        self.squares.iter().flatten().all(|square| *square != Square::Empty)
    }

    /// Every empty position, row-major.
    pub fn empty_positions(&self) -> Vec<BoardPosition> {
        BoardPosition::all().filter(|pos| self.is_empty(*pos)).collect()
    }

    /// Writes a square without any rule checks. Callers must validate first.
    pub(crate) fn set(&mut self, position: BoardPosition, square: Square) {
        self.squares[position.row][position.column] = square;
    }

    /// Builds a board from rows of `'X'`, `'O'` and anything else for empty.
    ///
    /// Intended for tests and fixtures; the X/O count invariant is not checked.
    pub fn from_rows(rows: [&str; BOARD_ROWS]) -> Self {
        let mut board = Self::new();
        for (row, line) in rows.iter().enumerate() {
            for (column, ch) in line.chars().take(BOARD_COLUMNS).enumerate() {
                let square = match ch {
                    'X' | 'x' => Square::Occupied(Piece::X),
                    'O' | 'o' => Square::Occupied(Piece::O),
                    _ => Square::Empty,
                };
                board.set(BoardPosition::new(row, column), square);
            }
        }
        board
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, squares) in self.squares.iter().enumerate() {
            for (column, square) in squares.iter().enumerate() {
                let symbol = match square {
                    Square::Empty => ".".to_string(),
                    Square::Occupied(piece) => piece.to_string(),
                };
                result.push_str(&symbol);
                if column < BOARD_COLUMNS - 1 {
                    result.push('|');
                }
            }
            if row < BOARD_ROWS - 1 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}
