//! Monte Carlo tree search engine.
//!
//! Wraps a `SearchController` over the PUCT engine so the search tree
//! survives between moves of the same game.

use chess::{Board, ChessMove};
use log::debug;

use crate::engines::engine_trait::{Engine, EngineOutput};
use crate::errors::SearchError;
use crate::game_state::chess_rules::ChessRules;
use crate::search::diagnostics::{DiagnosticSink, NullSink};
use crate::search::evaluation::MoveEvaluator;
use crate::search::puct_engine::{PuctConfig, PuctEngine};
use crate::search::search_config::{MoveOptions, SearchConfig};
use crate::search::search_controller::{ControllerStats, SearchController};

pub type ChessEvaluator = Box<dyn MoveEvaluator<Board, ChessMove>>;
pub type ChessPuctEngine = PuctEngine<ChessRules, ChessEvaluator>;

pub struct MctsEngine {
    controller: SearchController<ChessPuctEngine, Box<dyn DiagnosticSink>>,
}

impl MctsEngine {
    pub fn new(
        evaluator: ChessEvaluator,
        puct: PuctConfig,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        let engine = PuctEngine::new(ChessRules, evaluator, puct)?;
        let sink: Box<dyn DiagnosticSink> = Box::new(NullSink);
        let controller = SearchController::new(engine, config)?.with_sink(sink);
        Ok(Self { controller })
    }

    /// Route search diagnostics (PV lines, priors, notices) to `sink`.
    pub fn with_sink(self, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            controller: self.controller.with_sink(sink),
        }
    }

    pub fn stats(&self) -> ControllerStats {
        self.controller.stats()
    }

    pub fn config(&self) -> &SearchConfig {
        self.controller.config()
    }
}

impl Engine for MctsEngine {
    fn name(&self) -> &str {
        "Plum MCTS"
    }

    fn new_game(&mut self) {
        self.controller.reset();
    }

    fn choose_move(
        &mut self,
        board: &Board,
        options: &MoveOptions,
    ) -> Result<EngineOutput, SearchError> {
        let before = self.controller.stats();
        let mv = self.controller.select_move(board, *options)?;
        debug!("mcts chose {mv}");

        let after = self.controller.stats();
        let tree_source = if after.roots_created > before.roots_created {
            "new"
        } else {
            "reused"
        };
        Ok(EngineOutput {
            best_move: Some(mv),
            info_lines: vec![format!(
                "info string mcts visits {} best_share {:.3} iterations {} extension_rounds {} tree {}",
                after.last_root_visits,
                after.last_concentration,
                after.iterations - before.iterations,
                after.extension_rounds - before.extension_rounds,
                tree_source
            )],
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chess::Board;

    use super::MctsEngine;
    use crate::engines::engine_trait::Engine;
    use crate::errors::SearchError;
    use crate::game_state::chess_rules::{ChessRules, GameRules};
    use crate::search::diagnostics::RecordingSink;
    use crate::search::evaluation::MaterialEvaluator;
    use crate::search::puct_engine::PuctConfig;
    use crate::search::search_config::{MoveOptions, SearchConfig};

    fn engine(budget: u32) -> MctsEngine {
        MctsEngine::new(
            Box::new(MaterialEvaluator::default()),
            PuctConfig::default(),
            SearchConfig {
                budget,
                seed: Some(3),
                ..SearchConfig::default()
            },
        )
        .expect("engine config should be valid")
    }

    #[test]
    fn chooses_a_legal_move_with_info() {
        let mut engine = engine(64);
        let board = Board::default();
        let out = engine
            .choose_move(&board, &MoveOptions::default())
            .expect("engine should search");
        let mv = out.best_move.expect("start position has moves");
        assert!(ChessRules.legal_moves(&board).contains(&mv));
        assert!(out.info_lines[0].contains("tree new"));
    }

    #[test]
    fn checkmate_passes_no_legal_move_through() {
        let mate = Board::from_str("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .expect("FEN should parse");
        let err = engine(8)
            .choose_move(&mate, &MoveOptions::default())
            .expect_err("a mated side has no move to choose");
        assert!(
            matches!(&err, SearchError::NoLegalMove { fen } if fen.starts_with("rnb1kbnr/")),
            "unexpected error {err:?}"
        );
    }

    #[test]
    fn new_game_discards_the_tree() {
        let mut engine = engine(32);
        let board = Board::default();
        let mv = engine
            .choose_move(&board, &MoveOptions::default())
            .expect("engine should search")
            .best_move
            .expect("start position has moves");

        let after = ChessRules.apply_move(&board, mv);
        let out = engine
            .choose_move(&after, &MoveOptions::default())
            .expect("engine should search");
        assert!(out.info_lines[0].contains("tree reused"));

        engine.new_game();
        engine
            .choose_move(&board, &MoveOptions::default())
            .expect("engine should search");
        assert_eq!(engine.stats().roots_created, 2);
    }

    #[test]
    fn diagnostics_reach_the_configured_sink() {
        let mut engine = MctsEngine::new(
            Box::new(MaterialEvaluator::default()),
            PuctConfig::default(),
            SearchConfig {
                budget: 20,
                pv_lines: 1,
                seed: Some(3),
                ..SearchConfig::default()
            },
        )
        .expect("engine config should be valid")
        .with_sink(Box::new(RecordingSink::default()));

        let out = engine
            .choose_move(&Board::default(), &MoveOptions::default())
            .expect("engine should search");
        assert!(out.best_move.is_some());
        assert!(engine.stats().iterations > 20);
    }
}
