//! Turning root visit statistics into a move choice.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::search::search_config::SelectionMode;
use crate::search::search_tree::{NodeId, SearchTree};

/// Most visited child of `parent`; the first one wins ties.
pub fn most_visited_child<B: Clone, M: Clone>(
    tree: &SearchTree<B, M>,
    parent: NodeId,
) -> Option<NodeId> {
    let mut best: Option<NodeId> = None;
    for child in tree.node(parent).children() {
        let better = match best {
            None => true,
            Some(current) => tree.node(*child).visit_count() > tree.node(current).visit_count(),
        };
        if better {
            best = Some(*child);
        }
    }
    best
}

/// Child of `parent` sampled with weight equal to its visit count. Falls back
/// to the most visited child when no child has been visited.
pub fn visit_proportional_child<B: Clone, M: Clone, R: Rng + ?Sized>(
    tree: &SearchTree<B, M>,
    parent: NodeId,
    rng: &mut R,
) -> Option<NodeId> {
    let children = tree.node(parent).children();
    match children.choose_weighted(rng, |child| tree.node(*child).visit_count()) {
        Ok(child) => Some(*child),
        Err(_) => most_visited_child(tree, parent),
    }
}

pub fn select_child<B: Clone, M: Clone, R: Rng + ?Sized>(
    tree: &SearchTree<B, M>,
    parent: NodeId,
    mode: SelectionMode,
    rng: &mut R,
) -> Option<NodeId> {
    match mode {
        SelectionMode::MostVisited => most_visited_child(tree, parent),
        SelectionMode::VisitProportional => visit_proportional_child(tree, parent, rng),
    }
}

/// Best child's share of the parent's visits; 0 for unvisited parents.
pub fn visit_concentration<B: Clone, M: Clone>(tree: &SearchTree<B, M>, parent: NodeId) -> f64 {
    let parent_visits = tree.node(parent).visit_count();
    if parent_visits == 0 {
        return 0.0;
    }
    let best = tree
        .node(parent)
        .children()
        .iter()
        .map(|child| tree.node(*child).visit_count())
        .max()
        .unwrap_or(0);
    f64::from(best) / f64::from(parent_visits)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{most_visited_child, select_child, visit_concentration, visit_proportional_child};
    use crate::search::search_config::SelectionMode;
    use crate::search::search_tree::{ChildSpec, NodeId, SearchTree};

    fn tree_with_visits(visits: &[u32]) -> (SearchTree<u32, u8>, NodeId) {
        let mut tree = SearchTree::new(0u32);
        let root = tree.root();
        let children = visits
            .iter()
            .enumerate()
            .map(|(i, _)| ChildSpec {
                mv: i as u8,
                board: 10 + i as u32,
                prior: 1.0 / visits.len() as f32,
            })
            .collect();
        tree.expand(root, children).expect("expansion should succeed");

        let ids = tree.node(root).children().to_vec();
        for (id, count) in ids.iter().zip(visits) {
            for _ in 0..*count {
                tree.record_visit(*id, 0.0);
                tree.record_visit(root, 0.0);
            }
        }
        (tree, root)
    }

    #[test]
    fn deterministic_selection_takes_most_visited() {
        let (tree, root) = tree_with_visits(&[50, 30, 20]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let picked = select_child(&tree, root, SelectionMode::MostVisited, &mut rng)
                .expect("a child should be selected");
            assert_eq!(tree.node(picked).mv, Some(0));
        }
    }

    #[test]
    fn ties_go_to_the_first_child() {
        let (tree, root) = tree_with_visits(&[3, 7, 7, 2]);
        let picked = most_visited_child(&tree, root).expect("a child should be selected");
        assert_eq!(tree.node(picked).mv, Some(1));

        let (unvisited, root) = tree_with_visits(&[0, 0, 0]);
        let picked = most_visited_child(&unvisited, root).expect("a child should be selected");
        assert_eq!(unvisited.node(picked).mv, Some(0));
    }

    #[test]
    fn proportional_selection_matches_visit_shares() {
        let (tree, root) = tree_with_visits(&[50, 30, 20]);
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let trials = 20_000;
        let mut counts = [0u32; 3];
        for _ in 0..trials {
            let picked = visit_proportional_child(&tree, root, &mut rng)
                .expect("a child should be selected");
            let mv = tree.node(picked).mv.expect("children carry moves");
            counts[usize::from(mv)] += 1;
        }

        for (count, expected) in counts.iter().zip([0.5, 0.3, 0.2]) {
            let freq = f64::from(*count) / f64::from(trials);
            assert!(
                (freq - expected).abs() < 0.02,
                "frequency {freq} too far from {expected}"
            );
        }
    }

    #[test]
    fn proportional_selection_without_visits_falls_back() {
        let (tree, root) = tree_with_visits(&[0, 0]);
        let mut rng = StdRng::seed_from_u64(1);
        let picked =
            visit_proportional_child(&tree, root, &mut rng).expect("fallback should pick a child");
        assert_eq!(tree.node(picked).mv, Some(0));
    }

    #[test]
    fn concentration_is_best_share_of_parent_visits() {
        let (tree, root) = tree_with_visits(&[50, 30, 20]);
        assert!((visit_concentration(&tree, root) - 0.5).abs() < 1e-12);

        let fresh = SearchTree::<u32, u8>::new(0);
        assert_eq!(visit_concentration(&fresh, fresh.root()), 0.0);
    }
}
