//! Rules-engine seam used by the search.
//!
//! The search only ever talks to a `GameRules` implementation: it enumerates
//! legal moves, applies them, asks whether a board is finished and converts
//! moves to notation for diagnostics. `ChessRules` backs that seam with the
//! `chess` crate.

use std::fmt;

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece};

use crate::utils::san::move_to_san;

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Result of a finished game, seen from the side to move on the final board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

impl GameOutcome {
    /// Scalar value in `[-1, 1]` from the side to move.
    #[inline]
    pub const fn value(self) -> f32 {
        match self {
            GameOutcome::Win => 1.0,
            GameOutcome::Loss => -1.0,
            GameOutcome::Draw => 0.0,
        }
    }
}

pub trait GameRules {
    type Board: Clone + PartialEq + fmt::Debug;
    type Move: Copy + PartialEq + fmt::Debug;

    /// Legal moves in a fixed, deterministic order.
    fn legal_moves(&self, board: &Self::Board) -> Vec<Self::Move>;

    fn apply_move(&self, board: &Self::Board, mv: Self::Move) -> Self::Board;

    /// `None` while the game goes on.
    fn outcome(&self, board: &Self::Board) -> Option<GameOutcome>;

    fn move_notation(&self, board: &Self::Board, mv: Self::Move) -> String;

    /// Human-readable description of a board, used in error messages.
    fn describe(&self, board: &Self::Board) -> String {
        format!("{board:?}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChessRules;

impl GameRules for ChessRules {
    type Board = Board;
    type Move = ChessMove;

    fn legal_moves(&self, board: &Board) -> Vec<ChessMove> {
        MoveGen::new_legal(board).collect()
    }

    fn apply_move(&self, board: &Board, mv: ChessMove) -> Board {
        board.make_move_new(mv)
    }

    fn outcome(&self, board: &Board) -> Option<GameOutcome> {
        match board.status() {
            BoardStatus::Checkmate => Some(GameOutcome::Loss),
            BoardStatus::Stalemate => Some(GameOutcome::Draw),
            BoardStatus::Ongoing if is_insufficient_material(board) => Some(GameOutcome::Draw),
            BoardStatus::Ongoing => None,
        }
    }

    fn move_notation(&self, board: &Board, mv: ChessMove) -> String {
        move_to_san(board, mv)
    }

    fn describe(&self, board: &Board) -> String {
        board.to_string()
    }
}

/// Neither side can mate: bare kings, or a lone bishop or knight against a
/// bare king.
pub fn is_insufficient_material(board: &Board) -> bool {
    match board.combined().popcnt() {
        2 => true,
        3 => (*board.pieces(Piece::Bishop) | *board.pieces(Piece::Knight)).popcnt() == 1,
        _ => false,
    }
}
