//! Pure tic-tac-toe game logic.
//!
//! - **Types**: pieces, squares, positions and the board
//! - **Rules**: move legality, move application and outcome detection
//! - **Automated player**: skill-levelled move selection backed by an exhaustive search
//!
//! Nothing here performs I/O; every function is deterministic given its inputs
//! (and, for the automated player, its random number generator).
//!
//! # Example
//!
//! ```
//! use tictactoe_engine::{apply_move, evaluate, Board, BoardPosition, Outcome, Piece};
//!
//! let board = apply_move(&Board::new(), BoardPosition::new(1, 1), Piece::X).unwrap();
//! assert_eq!(evaluate(&board), Outcome::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod automated;
mod rules;
mod search;
mod types;

pub use automated::{AutomatedPlayer, SkillLevel, choose_move};
pub use rules::{
    LINES, Outcome, PlayStatus, RulesError, WinDetails, apply_move, check_winner, evaluate,
    is_legal_move, winning_moves,
};
pub use search::Solver;
pub use types::{BOARD_COLUMNS, BOARD_ROWS, Board, BoardPosition, Piece, Square};
