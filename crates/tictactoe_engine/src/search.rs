//! Exhaustive negamax search over tic-tac-toe positions.
//!
//! Conventions:
//! - Values are from the perspective of the side to move (`board.next_piece()`).
//! - A loss is worth `-(1 + empty squares)`, so faster wins score higher for the winner.
//! - Stalemate is worth 0.

use super::rules::check_winner;
use super::types::{Board, BoardPosition, Square};
use std::collections::HashMap;

/// Memoising negamax solver. The position space is tiny, so one table covers a whole game.
#[derive(Debug, Default)]
pub struct Solver {
    memo: HashMap<Board, i8>,
}

impl Solver {
    /// Creates a solver with an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `board` for the side to move.
    pub fn value(&mut self, board: &Board) -> i8 {
        if let Some(value) = self.memo.get(board) {
            return *value;
        }

        let empties = board.empty_positions();
        let value = if check_winner(board).is_some() {
            // Only the side that just moved can have completed a line.
            -(1 + empties.len() as i8)
        } else if empties.is_empty() {
            0
        } else {
            empties
                .iter()
                .map(|pos| -self.value(&Self::child(board, *pos)))
                .max()
                .unwrap_or(0)
        };

        self.memo.insert(*board, value);
        value
    }

    /// Every empty position with its value for the side to move.
    pub fn score_moves(&mut self, board: &Board) -> Vec<(BoardPosition, i8)> {
        if check_winner(board).is_some() {
            return Vec::new();
        }
        board
            .empty_positions()
            .into_iter()
            .map(|pos| (pos, -self.value(&Self::child(board, pos))))
            .collect()
    }

    /// The optimal moves for the side to move, row-major.
    pub fn best_moves(&mut self, board: &Board) -> Vec<BoardPosition> {
        let scored = self.score_moves(board);
        let Some(best) = scored.iter().map(|(_, value)| *value).max() else {
            return Vec::new();
        };
        scored
            .into_iter()
            .filter(|(_, value)| *value == best)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Board after the side to move plays `pos`.
    pub(crate) fn child(board: &Board, pos: BoardPosition) -> Board {
        let mut next = *board;
        next.set(pos, Square::Occupied(board.next_piece()));
        next
    }
}
