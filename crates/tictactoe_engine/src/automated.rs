//! Automated opponent that picks moves at a chosen skill level.

use super::rules::{check_winner, winning_moves};
use super::search::Solver;
use super::types::{Board, BoardPosition};
use derive_more::Display;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How well the automated player plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, strum::EnumIter,
)]
pub enum SkillLevel {
    /// Random legal moves.
    #[default]
    #[serde(alias = "beginner")]
    Beginner,
    /// Takes immediate wins and blocks immediate losses.
    #[serde(alias = "intermediate")]
    Intermediate,
    /// Perfect play.
    #[serde(alias = "expert")]
    Expert,
    /// Perfect play that also steers toward positions where the opponent can go wrong.
    #[serde(alias = "master")]
    Master,
}

/// Selects a move for the side to move on `board`.
///
/// Returns `None` when the board is full or already decided.
#[instrument(skip(board, rng))]
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    skill: SkillLevel,
    rng: &mut R,
) -> Option<BoardPosition> {
    if check_winner(board).is_some() {
        return None;
    }
    let open = board.empty_positions();
    if open.is_empty() {
        return None;
    }

    let choice = match skill {
        SkillLevel::Beginner => open.choose(rng).copied(),
        SkillLevel::Intermediate => tactical_move(board, &open, rng),
        SkillLevel::Expert => Solver::new().best_moves(board).choose(rng).copied(),
        SkillLevel::Master => master_move(board),
    };

    debug!(?skill, ?choice, "Automated move chosen");
    choice
}

/// Win if possible, else block, else random.
fn tactical_move<R: Rng + ?Sized>(
    board: &Board,
    open: &[BoardPosition],
    rng: &mut R,
) -> Option<BoardPosition> {
    let piece = board.next_piece();
    winning_moves(board, piece)
        .first()
        .copied()
        .or_else(|| winning_moves(board, piece.opponent()).first().copied())
        .or_else(|| open.choose(rng).copied())
}

/// Among optimal moves, prefer the one that leaves the opponent the fewest optimal replies.
fn master_move(board: &Board) -> Option<BoardPosition> {
    let mut solver = Solver::new();
    let candidates = solver.best_moves(board);

    candidates.into_iter().min_by_key(|pos| {
        let after = Solver::child(board, *pos);
        let optimal_replies = solver.best_moves(&after).len();
        (optimal_replies, placement_rank(*pos))
    })
}

/// Center first, then corners, then edges.
fn placement_rank(pos: BoardPosition) -> u8 {
    match (pos.row, pos.column) {
        (1, 1) => 0,
        (0 | 2, 0 | 2) => 1,
        _ => 2,
    }
}

/// A seeded automated player bound to one skill level.
#[derive(Debug, Clone)]
pub struct AutomatedPlayer {
    skill: SkillLevel,
    rng: StdRng,
}

impl AutomatedPlayer {
    /// Creates a player seeded from system entropy.
    pub fn new(skill: SkillLevel) -> Self {
        Self {
            skill,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a player with a fixed seed, for reproducible play.
    pub fn with_seed(skill: SkillLevel, seed: u64) -> Self {
        Self {
            skill,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The skill level.
    pub fn skill(&self) -> SkillLevel {
        self.skill
    }

    /// Picks the next move on `board`.
    pub fn choose_move(&mut self, board: &Board) -> Option<BoardPosition> {
        choose_move(board, self.skill, &mut self.rng)
    }
}
