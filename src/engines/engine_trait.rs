//! Engine abstraction used by the game loops.
//!
//! A game loop hands the engine the current board plus per-move options and
//! receives the chosen move together with free-form info lines.

use chess::{Board, ChessMove};

use crate::errors::SearchError;
use crate::search::search_config::MoveOptions;

#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub best_move: Option<ChessMove>,
    pub info_lines: Vec<String>,
}

pub trait Engine {
    fn name(&self) -> &str;

    /// Drop any state carried over from a previous game.
    fn new_game(&mut self) {}

    fn choose_move(
        &mut self,
        board: &Board,
        options: &MoveOptions,
    ) -> Result<EngineOutput, SearchError>;
}
