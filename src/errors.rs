//! Error types shared by the search core, the evaluation model loader and the
//! game loop.
//!
//! Usage guidelines:
//! - Search code returns `Result<..., SearchError>`. Callers match on
//!   `NoLegalMove` to detect a finished game; `EngineContract` is a bug in the
//!   search engine and is not meant to be recovered from.
//! - `ModelError` only appears while loading evaluator weights.
//! - `GameError` is what the interactive/self-play loops surface to `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// `select_move` was called on a position without legal moves.
    #[error("no legal move available in position {fen}")]
    NoLegalMove { fen: String },

    /// The search engine broke its contract (for example it never expanded a
    /// non-terminal root, or expanded a node twice).
    #[error("search engine contract violated: {0}")]
    EngineContract(String),

    /// Rejected configuration value.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// The evaluation model failed while scoring a leaf.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model weights: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model weights: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// The engine answered with a move that is not legal in the position.
    #[error("engine `{engine}` returned illegal move {mv}")]
    IllegalEngineMove { engine: String, mv: String },

    /// The engine produced no move for a position that still has legal moves.
    #[error("engine `{0}` returned no move")]
    MissingEngineMove(String),

    /// Standard input was closed while waiting for the human player.
    #[error("input closed")]
    InputClosed,
}
