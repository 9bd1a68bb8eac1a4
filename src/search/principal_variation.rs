//! Diagnostic views of the tree: principal variations and prior previews.
//!
//! Line `i` is forced through the `i`-th most visited root child and then
//! follows the most visited child until a leaf. Each line is extracted on its
//! own; nothing is shared between lines.

use std::fmt;

use crate::game_state::chess_rules::GameRules;
use crate::search::move_selection::most_visited_child;
use crate::search::search_tree::{NodeId, SearchTree};

/// Longest rendered line before the truncation marker.
pub const MAX_PV_MOVES: usize = 10;
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalVariation {
    pub moves: Vec<String>,
    /// First move's share of the root visits.
    pub visit_share: f64,
    /// First move's value from the root's side to move.
    pub value: f64,
    pub truncated: bool,
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.moves.len() + 1);
        for (i, mv) in self.moves.iter().enumerate() {
            if i == 0 {
                parts.push(format!(
                    "{mv} {:.1}% ({:.2})",
                    self.visit_share * 100.0,
                    self.value
                ));
            } else {
                parts.push(mv.clone());
            }
        }
        if self.truncated {
            parts.push(TRUNCATION_MARKER.to_owned());
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriorEntry {
    pub notation: String,
    pub prior: f32,
}

impl fmt::Display for PriorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.1}%", self.notation, self.prior * 100.0)
    }
}

pub fn extract_principal_variations<R: GameRules>(
    tree: &SearchTree<R::Board, R::Move>,
    rules: &R,
    root: NodeId,
    count: usize,
) -> Vec<PrincipalVariation> {
    let mut ranked = tree.node(root).children().to_vec();
    // Stable sort keeps engine order among equal visit counts.
    ranked.sort_by(|a, b| tree.node(*b).visit_count().cmp(&tree.node(*a).visit_count()));

    let root_visits = f64::from(tree.node(root).visit_count().max(1));

    ranked
        .into_iter()
        .take(count)
        .map(|first| {
            let first_node = tree.node(first);
            let mut moves = Vec::with_capacity(MAX_PV_MOVES);
            let mut cursor = Some(first);
            let mut truncated = false;

            while let Some(node) = cursor {
                if moves.len() == MAX_PV_MOVES {
                    truncated = true;
                    break;
                }
                moves.push(notation_of(tree, rules, node));
                cursor = most_visited_child(tree, node);
            }

            PrincipalVariation {
                moves,
                visit_share: f64::from(first_node.visit_count()) / root_visits,
                value: -first_node.value_estimate(),
                truncated,
            }
        })
        .collect()
}

/// Up to `limit` children of `root`, highest prior first.
pub fn prior_preview<R: GameRules>(
    tree: &SearchTree<R::Board, R::Move>,
    rules: &R,
    root: NodeId,
    limit: usize,
) -> Vec<PriorEntry> {
    let mut children = tree.node(root).children().to_vec();
    children.sort_by(|a, b| tree.node(*b).prior.total_cmp(&tree.node(*a).prior));
    children
        .into_iter()
        .take(limit)
        .map(|child| PriorEntry {
            notation: notation_of(tree, rules, child),
            prior: tree.node(child).prior,
        })
        .collect()
}

/// Notation of the move leading into `node`, read from its parent's board.
fn notation_of<R: GameRules>(
    tree: &SearchTree<R::Board, R::Move>,
    rules: &R,
    node: NodeId,
) -> String {
    let current = tree.node(node);
    match (current.parent, current.mv) {
        (Some(parent), Some(mv)) => rules.move_notation(&tree.node(parent).board, mv),
        _ => String::new(),
    }
}
