//! Small deterministic games and scripted engines for search tests.

use crate::errors::SearchError;
use crate::game_state::chess_rules::{GameOutcome, GameRules};
use crate::search::search_engine::SearchEngine;
use crate::search::search_tree::{ChildSpec, NodeId, SearchTree};

/// Take-away game: remove 1 to 3 counters, whoever takes the last one wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct TakeAwayRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pile {
    pub counters: u8,
    pub ply: u16,
}

impl TakeAwayRules {
    pub fn start(self, counters: u8) -> Pile {
        Pile { counters, ply: 0 }
    }
}

impl GameRules for TakeAwayRules {
    type Board = Pile;
    type Move = u8;

    fn legal_moves(&self, board: &Pile) -> Vec<u8> {
        (1..=board.counters.min(3)).collect()
    }

    fn apply_move(&self, board: &Pile, mv: u8) -> Pile {
        Pile {
            counters: board.counters - mv,
            ply: board.ply + 1,
        }
    }

    fn outcome(&self, board: &Pile) -> Option<GameOutcome> {
        (board.counters == 0).then_some(GameOutcome::Loss)
    }

    fn move_notation(&self, _board: &Pile, mv: u8) -> String {
        format!("-{mv}")
    }
}

/// Engine that expands a node into `width` children on its first visit and
/// afterwards sends each rollout to the child picked by a fixed cycle of
/// child indices.
pub struct ScriptedEngine {
    pub rules: TakeAwayRules,
    pub width: u8,
    pub cycle: Vec<usize>,
    pub expand: bool,
    step: usize,
}

impl ScriptedEngine {
    pub fn new(width: u8, cycle: Vec<usize>) -> Self {
        Self {
            rules: TakeAwayRules,
            width,
            cycle,
            expand: true,
            step: 0,
        }
    }

    /// Engine that counts visits but never populates the node.
    pub fn lazy() -> Self {
        Self {
            expand: false,
            ..Self::new(1, vec![0])
        }
    }

    /// Children get descending priors: the first child is the favourite.
    fn children_of(&self, board: Pile) -> Vec<ChildSpec<Pile, u8>> {
        let total: f32 = (1..=self.width).map(f32::from).sum();
        (0..self.width)
            .map(|i| ChildSpec {
                mv: i,
                board: Pile {
                    counters: board.counters.wrapping_add(i + 1),
                    ply: board.ply + 1,
                },
                prior: f32::from(self.width - i) / total,
            })
            .collect()
    }
}

impl SearchEngine for ScriptedEngine {
    type Rules = TakeAwayRules;

    fn rules(&self) -> &TakeAwayRules {
        &self.rules
    }

    fn rollout(
        &mut self,
        tree: &mut SearchTree<Pile, u8>,
        node: NodeId,
    ) -> Result<(), SearchError> {
        if self.expand && !tree.node(node).is_expanded() {
            let children = self.children_of(tree.node(node).board);
            tree.expand(node, children)?;
        } else if self.expand {
            let slot = self.cycle[self.step % self.cycle.len()];
            self.step += 1;
            let child = tree.node(node).children()[slot];
            tree.record_visit(child, 0.0);
        }
        tree.record_visit(node, 0.0);
        Ok(())
    }
}
