//! Evaluation-model seam feeding priors and leaf values into the search.
//!
//! `MaterialEvaluator` is a small stand-in for a learned model: move priors
//! come from a softmax over capture/promotion/check gains and the position
//! value from the material balance. Its weights are read from a JSON file so
//! the command line can point at a "model".

use std::fs;
use std::path::Path;

use chess::{Board, ChessMove, Color, Piece, ALL_PIECES};
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, SearchError};

/// Priors aligned with the move list handed to the evaluator, plus a value in
/// `[-1, 1]` from the side to move.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub priors: Vec<f32>,
    pub value: f32,
}

pub trait MoveEvaluator<B, M> {
    fn evaluate(&self, board: &B, moves: &[M]) -> Result<Evaluation, SearchError>;
}

impl<B, M, T: MoveEvaluator<B, M> + ?Sized> MoveEvaluator<B, M> for Box<T> {
    fn evaluate(&self, board: &B, moves: &[M]) -> Result<Evaluation, SearchError> {
        (**self).evaluate(board, moves)
    }
}

/// Equal priors, neutral value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl<B, M> MoveEvaluator<B, M> for UniformEvaluator {
    fn evaluate(&self, _board: &B, moves: &[M]) -> Result<Evaluation, SearchError> {
        let prior = if moves.is_empty() {
            0.0
        } else {
            1.0 / moves.len() as f32
        };
        Ok(Evaluation {
            priors: vec![prior; moves.len()],
            value: 0.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialWeights {
    pub pawn: f32,
    pub knight: f32,
    pub bishop: f32,
    pub rook: f32,
    pub queen: f32,
    pub check_bonus: f32,
    /// Softmax temperature applied to move scores.
    pub temperature: f32,
    /// Material balance mapped to a value of `tanh(1)` ~ 0.76.
    pub value_scale: f32,
}

impl Default for MaterialWeights {
    fn default() -> Self {
        Self {
            pawn: 100.0,
            knight: 320.0,
            bishop: 330.0,
            rook: 500.0,
            queen: 900.0,
            check_bonus: 50.0,
            temperature: 100.0,
            value_scale: 600.0,
        }
    }
}

impl MaterialWeights {
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let weights: Self = serde_json::from_str(text)?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.temperature > 0.0) {
            return Err(ModelError::Invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if !(self.value_scale > 0.0) {
            return Err(ModelError::Invalid(format!(
                "value_scale must be positive, got {}",
                self.value_scale
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn piece_value(&self, piece: Piece) -> f32 {
        match piece {
            Piece::Pawn => self.pawn,
            Piece::Knight => self.knight,
            Piece::Bishop => self.bishop,
            Piece::Rook => self.rook,
            Piece::Queen => self.queen,
            Piece::King => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialEvaluator {
    weights: MaterialWeights,
}

impl MaterialEvaluator {
    pub fn new(weights: MaterialWeights) -> Self {
        Self { weights }
    }

    fn move_score(&self, board: &Board, mv: ChessMove) -> f32 {
        let mut score = 0.0;

        if let Some(captured) = board.piece_on(mv.get_dest()) {
            score += self.weights.piece_value(captured);
        } else if board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file()
        {
            score += self.weights.pawn;
        }

        if let Some(promotion) = mv.get_promotion() {
            score += self.weights.piece_value(promotion) - self.weights.pawn;
        }

        if board.make_move_new(mv).checkers().popcnt() > 0 {
            score += self.weights.check_bonus;
        }

        score
    }

    fn material_balance(&self, board: &Board) -> f32 {
        let mut white_minus_black = 0.0;
        for piece in ALL_PIECES {
            let value = self.weights.piece_value(piece);
            let pieces = *board.pieces(piece);
            let white = (pieces & *board.color_combined(Color::White)).popcnt() as f32;
            let black = (pieces & *board.color_combined(Color::Black)).popcnt() as f32;
            white_minus_black += (white - black) * value;
        }

        match board.side_to_move() {
            Color::White => white_minus_black,
            Color::Black => -white_minus_black,
        }
    }
}

impl MoveEvaluator<Board, ChessMove> for MaterialEvaluator {
    fn evaluate(&self, board: &Board, moves: &[ChessMove]) -> Result<Evaluation, SearchError> {
        let scores: Vec<f32> = moves
            .iter()
            .map(|mv| self.move_score(board, *mv) / self.weights.temperature)
            .collect();

        let priors = softmax(&scores);
        if priors.iter().any(|p| !p.is_finite()) {
            return Err(SearchError::Evaluation(format!(
                "non-finite priors for position {board}"
            )));
        }

        let value = (self.material_balance(board) / self.weights.value_scale).tanh();
        Ok(Evaluation { priors, value })
    }
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chess::{Board, ChessMove, MoveGen, Square};

    use super::{MaterialEvaluator, MaterialWeights, MoveEvaluator, UniformEvaluator};

    #[test]
    fn uniform_priors_sum_to_one() {
        let moves = [1u8, 2, 3, 4];
        let eval = UniformEvaluator
            .evaluate(&0u8, &moves)
            .expect("uniform evaluation should succeed");
        assert_eq!(eval.priors, vec![0.25; 4]);
        assert_eq!(eval.value, 0.0);
    }

    #[test]
    fn material_priors_favor_winning_captures() {
        // White can take an undefended queen on d5.
        let board = Board::from_str("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let eval = MaterialEvaluator::default()
            .evaluate(&board, &moves)
            .expect("material evaluation should succeed");

        let total: f32 = eval.priors.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);

        let capture = ChessMove::new(Square::E4, Square::D5, None);
        let capture_idx = moves
            .iter()
            .position(|mv| *mv == capture)
            .expect("exd5 should be legal");
        let best_idx = eval
            .priors
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > eval.priors[best] { i } else { best });
        assert_eq!(best_idx, capture_idx);

        // White is a queen down for a pawn.
        assert!(eval.value < -0.5);
    }

    #[test]
    fn start_position_value_is_balanced() {
        let board = Board::default();
        let moves: Vec<ChessMove> = MoveGen::new_legal(&board).collect();
        let eval = MaterialEvaluator::default()
            .evaluate(&board, &moves)
            .expect("material evaluation should succeed");
        assert_eq!(eval.value, 0.0);
        assert_eq!(eval.priors.len(), 20);
    }

    #[test]
    fn weights_parse_from_partial_json() {
        let weights = MaterialWeights::from_json(r#"{ "queen": 950.0, "temperature": 80.0 }"#)
            .expect("partial weights should parse");
        assert_eq!(weights.queen, 950.0);
        assert_eq!(weights.temperature, 80.0);
        assert_eq!(weights.rook, MaterialWeights::default().rook);

        assert!(MaterialWeights::from_json(r#"{ "temperature": 0.0 }"#).is_err());
        assert!(MaterialWeights::from_json("not json").is_err());
    }
}
