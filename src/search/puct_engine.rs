//! PUCT rollout engine.
//!
//! Selection follows `-Q(child) + c_puct * P(child) * sqrt(N(parent)) / (1 + N(child))`,
//! leaves are expanded with evaluator priors and valued by the evaluator (or
//! by the game outcome on terminal boards), and the value is backed up with
//! alternating sign.

use log::trace;

use crate::errors::SearchError;
use crate::game_state::chess_rules::GameRules;
use crate::search::evaluation::MoveEvaluator;
use crate::search::search_engine::SearchEngine;
use crate::search::search_tree::{ChildSpec, NodeId, SearchTree};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuctConfig {
    pub c_puct: f64,
}

impl Default for PuctConfig {
    fn default() -> Self {
        Self { c_puct: 1.5 }
    }
}

impl PuctConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.c_puct.is_finite() && self.c_puct > 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "c_puct must be positive and finite, got {}",
                self.c_puct
            )));
        }
        Ok(())
    }
}

pub struct PuctEngine<R, E> {
    rules: R,
    evaluator: E,
    config: PuctConfig,
}

impl<R, E> PuctEngine<R, E>
where
    R: GameRules,
    E: MoveEvaluator<R::Board, R::Move>,
{
    pub fn new(rules: R, evaluator: E, config: PuctConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            rules,
            evaluator,
            config,
        })
    }

    fn select_child(&self, tree: &SearchTree<R::Board, R::Move>, parent: NodeId) -> Option<NodeId> {
        let parent_node = tree.node(parent);
        let sqrt_parent = f64::from(parent_node.visit_count()).sqrt();

        let mut best: Option<(NodeId, f64)> = None;
        for child in parent_node.children() {
            let node = tree.node(*child);
            let exploration = self.config.c_puct * f64::from(node.prior) * sqrt_parent
                / (1.0 + f64::from(node.visit_count()));
            let score = -node.value_estimate() + exploration;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((*child, score));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Expand `leaf` if needed and return its value from its side to move.
    fn evaluate_leaf(
        &self,
        tree: &mut SearchTree<R::Board, R::Move>,
        leaf: NodeId,
    ) -> Result<f64, SearchError> {
        let board = tree.node(leaf).board.clone();
        let outcome = self.rules.outcome(&board);

        if tree.node(leaf).is_expanded() {
            // Only terminal leaves stay childless after expansion.
            return Ok(outcome.map_or(0.0, |o| f64::from(o.value())));
        }

        let moves = self.rules.legal_moves(&board);
        if moves.is_empty() {
            tree.expand(leaf, Vec::new())?;
            return Ok(outcome.map_or(0.0, |o| f64::from(o.value())));
        }

        let evaluation = self.evaluator.evaluate(&board, &moves)?;
        if evaluation.priors.len() != moves.len() {
            return Err(SearchError::Evaluation(format!(
                "evaluator returned {} priors for {} moves",
                evaluation.priors.len(),
                moves.len()
            )));
        }

        let children = moves
            .iter()
            .zip(evaluation.priors.iter())
            .map(|(mv, prior)| ChildSpec {
                mv: *mv,
                board: self.rules.apply_move(&board, *mv),
                prior: *prior,
            })
            .collect();
        tree.expand(leaf, children)?;

        Ok(match outcome {
            Some(adjudicated) => f64::from(adjudicated.value()),
            None => f64::from(evaluation.value),
        })
    }
}

impl<R, E> SearchEngine for PuctEngine<R, E>
where
    R: GameRules,
    E: MoveEvaluator<R::Board, R::Move>,
{
    type Rules = R;

    fn rules(&self) -> &R {
        &self.rules
    }

    fn rollout(
        &mut self,
        tree: &mut SearchTree<R::Board, R::Move>,
        node: NodeId,
    ) -> Result<(), SearchError> {
        let mut path = vec![node];
        let mut current = node;
        while tree.node(current).is_expanded() {
            match self.select_child(tree, current) {
                Some(child) => {
                    current = child;
                    path.push(child);
                }
                None => break,
            }
        }

        let mut value = self.evaluate_leaf(tree, current)?;
        trace!("rollout depth {} leaf value {:.3}", path.len() - 1, value);

        for id in path.iter().rev() {
            tree.record_visit(*id, value);
            value = -value;
        }

        Ok(())
    }
}
