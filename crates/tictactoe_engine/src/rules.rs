//! Game rules for tic-tac-toe: move legality, move application, outcome detection.
//!
//! Everything here is a pure function of the board.

use super::types::{Board, BoardPosition, Piece, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// The eight winning lines, in scan order: rows, columns, main diagonal, anti-diagonal.
pub const LINES: [[BoardPosition; 3]; 8] = [
    [BoardPosition::new(0, 0), BoardPosition::new(0, 1), BoardPosition::new(0, 2)],
    [BoardPosition::new(1, 0), BoardPosition::new(1, 1), BoardPosition::new(1, 2)],
    [BoardPosition::new(2, 0), BoardPosition::new(2, 1), BoardPosition::new(2, 2)],
    [BoardPosition::new(0, 0), BoardPosition::new(1, 0), BoardPosition::new(2, 0)],
    [BoardPosition::new(0, 1), BoardPosition::new(1, 1), BoardPosition::new(2, 1)],
    [BoardPosition::new(0, 2), BoardPosition::new(1, 2), BoardPosition::new(2, 2)],
    [BoardPosition::new(0, 0), BoardPosition::new(1, 1), BoardPosition::new(2, 2)],
    [BoardPosition::new(0, 2), BoardPosition::new(1, 1), BoardPosition::new(2, 0)],
];

/// A completed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinDetails {
    /// The piece filling the line.
    pub piece: Piece,
    /// The three collinear positions.
    pub locations: [BoardPosition; 3],
}

/// What a board says about the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Moves remain and nobody has won.
    InProgress,
    /// A line is complete.
    Win(WinDetails),
    /// Board full, no line complete.
    Stalemate,
}

impl Outcome {
    /// Whether the game is over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum PlayStatus {
    /// Players not yet bound.
    #[default]
    NotStarted,
    /// Moves are being accepted.
    InProgress,
    /// Someone completed a line.
    EndedInWin,
    /// Board filled without a winner.
    EndedInStalemate,
}

impl PlayStatus {
    /// Whether the status is terminal.
    pub fn has_ended(self) -> bool {
        matches!(self, PlayStatus::EndedInWin | PlayStatus::EndedInStalemate)
    }
}

impl From<&Outcome> for PlayStatus {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::InProgress => PlayStatus::InProgress,
            Outcome::Win(_) => PlayStatus::EndedInWin,
            Outcome::Stalemate => PlayStatus::EndedInStalemate,
        }
    }
}

/// Error from applying a move to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum RulesError {
    /// The position is not on the board.
    #[display("Position {} is off the board", _0)]
    OutOfRange(#[error(not(source))] BoardPosition),

    /// The square already holds a piece.
    #[display("Square {} is already occupied", _0)]
    Occupied(#[error(not(source))] BoardPosition),

    /// The piece is not the one due to move.
    #[display("It is not {}'s turn", _0)]
    OutOfTurn(#[error(not(source))] Piece),

    /// The board already has a result.
    #[display("Game is already over")]
    GameOver,
}

/// Checks whether a move to `position` is legal on `board`.
///
/// Legal means on the board, onto an empty square, while the game is undecided.
#[instrument(skip(board))]
pub fn is_legal_move(board: &Board, position: BoardPosition) -> bool {
    position.is_in_range() && board.is_empty(position) && !evaluate(board).is_terminal()
}

/// Places `piece` at `position`, returning the new board.
#[instrument(skip(board))]
pub fn apply_move(board: &Board, position: BoardPosition, piece: Piece) -> Result<Board, RulesError> {
    if !position.is_in_range() {
        return Err(RulesError::OutOfRange(position));
    }
    if evaluate(board).is_terminal() {
        return Err(RulesError::GameOver);
    }
    if !board.is_empty(position) {
        return Err(RulesError::Occupied(position));
    }
    if piece != board.next_piece() {
        return Err(RulesError::OutOfTurn(piece));
    }

    let mut next = *board;
    next.set(position, Square::Occupied(piece));
    Ok(next)
}

/// Evaluates the board.
///
/// Returns the first complete line in [`LINES`] order, else stalemate on a
/// full board, else in progress.
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(win) = check_winner(board) {
        return Outcome::Win(win);
    }
    if board.is_full() {
        Outcome::Stalemate
    } else {
        Outcome::InProgress
    }
}

/// Finds the first complete line, if any.
pub fn check_winner(board: &Board) -> Option<WinDetails> {
    LINES.iter().find_map(|line| {
        let squares = line.map(|pos| board.get(pos));
        match squares {
            [Some(Square::Occupied(a)), Some(Square::Occupied(b)), Some(Square::Occupied(c))]
                if a == b && b == c =>
            {
                Some(WinDetails {
                    piece: a,
                    locations: *line,
                })
            }
            _ => None,
        }
    })
}

/// Positions where `piece` would complete a line with its next placement.
pub fn winning_moves(board: &Board, piece: Piece) -> Vec<BoardPosition> {
    board
        .empty_positions()
        .into_iter()
        .filter(|pos| {
            LINES.iter().any(|line| {
                line.contains(pos)
                    && line
                        .iter()
                        .filter(|other| *other != pos)
                        .all(|other| board.get(*other) == Some(Square::Occupied(piece)))
            })
        })
        .collect()
}
