//! Per-game search controller.
//!
//! Keeps the search tree alive between moves. On each call it first tries to
//! reuse the retained tree (a child whose board matches, or the root itself),
//! runs a fixed budget of rollouts, keeps adding batches while no root child
//! holds enough of the visits, then picks a child and keeps it as the next
//! root.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::SearchError;
use crate::game_state::chess_rules::GameRules;
use crate::search::diagnostics::{DiagnosticSink, NullSink};
use crate::search::move_selection::{select_child, visit_concentration};
use crate::search::principal_variation::{
    extract_principal_variations, prior_preview, PrincipalVariation,
};
use crate::search::search_config::{MoveOptions, SearchConfig};
use crate::search::search_engine::{EngineTree, RulesBoard, RulesMove, SearchEngine};
use crate::search::search_tree::{NodeId, SearchTree};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerStats {
    /// Fresh roots built because nothing matched the board.
    pub roots_created: u64,
    /// Calls that promoted a child of the retained root.
    pub roots_reused: u64,
    /// Calls where the retained root already held the board.
    pub roots_retained: u64,
    pub extension_rounds: u64,
    pub iterations: u64,
    /// Root visit count at the last decision.
    pub last_root_visits: u32,
    /// Best child's share of root visits at the last decision.
    pub last_concentration: f64,
}

pub struct SearchController<S: SearchEngine, D: DiagnosticSink = NullSink> {
    engine: S,
    config: SearchConfig,
    tree: Option<EngineTree<S>>,
    sink: D,
    rng: StdRng,
    stats: ControllerStats,
}

impl<S: SearchEngine> SearchController<S, NullSink> {
    pub fn new(engine: S, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            engine,
            config,
            tree: None,
            sink: NullSink,
            rng,
            stats: ControllerStats::default(),
        })
    }
}

impl<S: SearchEngine, D: DiagnosticSink> SearchController<S, D> {
    pub fn with_sink<D2: DiagnosticSink>(self, sink: D2) -> SearchController<S, D2> {
        SearchController {
            engine: self.engine,
            config: self.config,
            tree: self.tree,
            sink,
            rng: self.rng,
            stats: self.stats,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn tree(&self) -> Option<&EngineTree<S>> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.as_ref().map(SearchTree::root)
    }

    /// Forget the retained tree, for example when a new game starts.
    pub fn reset(&mut self) {
        self.tree = None;
    }

    /// PV lines of the currently retained root.
    pub fn principal_variations(&self, count: usize) -> Vec<PrincipalVariation> {
        match &self.tree {
            Some(tree) => {
                extract_principal_variations(tree, self.engine.rules(), tree.root(), count)
            }
            None => Vec::new(),
        }
    }

    /// Search `board` and return the chosen move. The chosen child becomes the
    /// retained root for the next call.
    pub fn select_move(
        &mut self,
        board: &RulesBoard<S>,
        options: MoveOptions,
    ) -> Result<RulesMove<S>, SearchError> {
        self.sync_root(board, options.debug);

        if self.config.pv_lines > 0 {
            self.preview_priors()?;
        }

        let mut round = 0u32;
        loop {
            self.run_batch()?;

            let Some(tree) = self.tree.as_ref() else {
                return Err(SearchError::EngineContract("search tree vanished".to_owned()));
            };
            let root = tree.root();
            let child_count = tree.node(root).children().len();
            if child_count == 0 {
                return Err(self.unexpanded_root_error(board));
            }

            let concentration = visit_concentration(tree, root);
            self.stats.last_concentration = concentration;
            self.stats.last_root_visits = tree.node(root).visit_count();

            if child_count == 1 || concentration >= self.config.min_visit_share {
                break;
            }
            if let Some(cap) = self.config.max_extension_rounds {
                if round >= cap {
                    warn!(
                        "visit share {:.3} below {:.3} after {} extra rounds, using best move so far",
                        concentration, self.config.min_visit_share, cap
                    );
                    break;
                }
            }

            round += 1;
            self.stats.extension_rounds += 1;
            info!(
                "best move holds {:.1}% of {} visits, searching deeper (round {})",
                concentration * 100.0,
                self.stats.last_root_visits,
                round
            );
            self.sink.deeper_search(round);
        }

        let Some(tree) = self.tree.as_mut() else {
            return Err(SearchError::EngineContract("search tree vanished".to_owned()));
        };
        let root = tree.root();
        let chosen = select_child(tree, root, options.selection_mode(), &mut self.rng)
            .ok_or_else(|| SearchError::EngineContract("root lost its children".to_owned()))?;
        let mv = tree.node(chosen).mv.ok_or_else(|| {
            SearchError::EngineContract("child node without originating move".to_owned())
        })?;

        debug!(
            "selected child with {} of {} visits",
            tree.node(chosen).visit_count(),
            tree.node(root).visit_count()
        );
        tree.promote(chosen);
        Ok(mv)
    }

    fn sync_root(&mut self, board: &RulesBoard<S>, announce: bool) {
        if let Some(tree) = self.tree.as_mut() {
            let root = tree.root();
            if let Some(child) = tree.find_child_by_board(root, board) {
                tree.promote(child);
                self.stats.roots_reused += 1;
                debug!(
                    "reusing subtree with {} visits ({} nodes)",
                    tree.node(tree.root()).visit_count(),
                    tree.len()
                );
                return;
            }
            if tree.node(root).board == *board {
                self.stats.roots_retained += 1;
                debug!("retained root already matches the board");
                return;
            }
        }

        self.tree = Some(SearchTree::new(board.clone()));
        self.stats.roots_created += 1;
        debug!("creating new root");
        if announce {
            self.sink.new_root();
        }
    }

    fn preview_priors(&mut self) -> Result<(), SearchError> {
        let Some(tree) = self.tree.as_mut() else {
            return Ok(());
        };
        let root = tree.root();
        self.engine.rollout(tree, root)?;
        self.stats.iterations += 1;

        let entries = prior_preview(tree, self.engine.rules(), root, self.config.prior_preview_len);
        if !entries.is_empty() {
            self.sink.priors(&entries);
        }
        Ok(())
    }

    fn run_batch(&mut self) -> Result<(), SearchError> {
        let Some(tree) = self.tree.as_mut() else {
            return Ok(());
        };
        let root = tree.root();
        let budget = self.config.budget;
        let pv_lines = self.config.pv_lines;
        let mut reported = 0;

        for i in 0..budget {
            self.engine.rollout(tree, root)?;
            self.stats.iterations += 1;

            if pv_lines > 0 && (i % self.config.pv_report_interval == 0 || i == budget - 1) {
                let lines = extract_principal_variations(tree, self.engine.rules(), root, pv_lines);
                reported = lines.len();
                self.sink.principal_variations(i + 1, &lines);
            }
        }

        if pv_lines > 0 {
            self.sink.batch_finished(reported);
        }
        Ok(())
    }

    fn unexpanded_root_error(&self, board: &RulesBoard<S>) -> SearchError {
        let rules = self.engine.rules();
        if rules.legal_moves(board).is_empty() {
            SearchError::NoLegalMove {
                fen: rules.describe(board),
            }
        } else {
            SearchError::EngineContract(format!(
                "root with legal moves still has no children after {} rollouts",
                self.config.budget
            ))
        }
    }
}
