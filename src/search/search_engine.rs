//! Single-iteration contract between the controller and a search engine.

use crate::errors::SearchError;
use crate::game_state::chess_rules::GameRules;
use crate::search::search_tree::{NodeId, SearchTree};

pub type RulesBoard<E> = <<E as SearchEngine>::Rules as GameRules>::Board;
pub type RulesMove<E> = <<E as SearchEngine>::Rules as GameRules>::Move;
pub type EngineTree<E> = SearchTree<RulesBoard<E>, RulesMove<E>>;

/// One rollout starting at `node` must:
/// - walk existing statistics down to a leaf,
/// - expand that leaf once if it is not terminal (one child per legal move, in
///   the rules engine's order, priors from the evaluation model),
/// - call [`SearchTree::record_visit`] exactly once on every node of the
///   walked path, with values from each node's own side to move.
///
/// Errors (for example from the evaluation model) are returned as-is; the
/// controller does not retry.
pub trait SearchEngine {
    type Rules: GameRules;

    fn rules(&self) -> &Self::Rules;

    fn rollout(&mut self, tree: &mut EngineTree<Self>, node: NodeId) -> Result<(), SearchError>;
}
