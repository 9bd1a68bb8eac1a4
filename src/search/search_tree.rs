//! Index-addressed arena holding the persistent search tree.
//!
//! Nodes refer to their children by `NodeId`, and to their parent through a
//! plain index that is only followed to rebuild notation chains. Promoting a
//! child to root compacts its subtree into a fresh arena, so every sibling
//! subtree is released at that moment.

use std::collections::VecDeque;

use crate::errors::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode<B, M> {
    pub board: B,
    /// Move that produced this node from its parent; `None` for a root.
    pub mv: Option<M>,
    pub parent: Option<NodeId>,
    pub prior: f32,
    visit_count: u32,
    value_sum: f64,
    children: Vec<NodeId>,
    expanded: bool,
}

impl<B, M> SearchNode<B, M> {
    fn new(board: B, mv: Option<M>, parent: Option<NodeId>, prior: f32) -> Self {
        Self {
            board,
            mv,
            parent,
            prior,
            visit_count: 0,
            value_sum: 0.0,
            children: Vec::new(),
            expanded: false,
        }
    }

    #[inline]
    pub fn visit_count(&self) -> u32 {
        self.visit_count
    }

    /// Mean backed-up value from this node's own side to move.
    #[inline]
    pub fn value_estimate(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / f64::from(self.visit_count)
        }
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// One child handed to [`SearchTree::expand`].
#[derive(Debug, Clone)]
pub struct ChildSpec<B, M> {
    pub mv: M,
    pub board: B,
    pub prior: f32,
}

#[derive(Debug, Clone)]
pub struct SearchTree<B, M> {
    nodes: Vec<SearchNode<B, M>>,
    root: NodeId,
}

impl<B: Clone, M: Clone> SearchTree<B, M> {
    /// Tree holding a single unexpanded root.
    pub fn new(board: B) -> Self {
        Self {
            nodes: vec![SearchNode::new(board, None, None, 1.0)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SearchNode<B, M> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Populate the children of `id`. A node can be expanded only once; an
    /// empty child list marks it as a terminal leaf.
    pub fn expand(
        &mut self,
        id: NodeId,
        children: Vec<ChildSpec<B, M>>,
    ) -> Result<(), SearchError> {
        if self.nodes[id.index()].expanded {
            return Err(SearchError::EngineContract(format!(
                "node {} expanded twice",
                id.index()
            )));
        }

        let first = self.nodes.len();
        let ids: Vec<NodeId> = (first..first + children.len())
            .map(|i| NodeId(i as u32))
            .collect();
        for spec in children {
            self.nodes
                .push(SearchNode::new(spec.board, Some(spec.mv), Some(id), spec.prior));
        }

        let node = &mut self.nodes[id.index()];
        node.children = ids;
        node.expanded = true;
        Ok(())
    }

    /// Count one completed iteration through `id` and accumulate `value`
    /// (from that node's side to move).
    #[inline]
    pub fn record_visit(&mut self, id: NodeId, value: f64) {
        let node = &mut self.nodes[id.index()];
        node.visit_count = node.visit_count.saturating_add(1);
        node.value_sum += value;
    }

    /// Child of `parent` whose board equals `board`.
    pub fn find_child_by_board(&self, parent: NodeId, board: &B) -> Option<NodeId>
    where
        B: PartialEq,
    {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).board == *board)
    }

    /// Make `id` the new root. Its subtree is copied into a fresh arena with
    /// renumbered ids; everything else is dropped.
    pub fn promote(&mut self, id: NodeId) -> NodeId {
        let mut remap = vec![None::<u32>; self.nodes.len()];
        let mut order = Vec::<NodeId>::new();
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            remap[current.index()] = Some(order.len() as u32);
            order.push(current);
            queue.extend(self.node(current).children.iter().copied());
        }

        let mut old_nodes: Vec<Option<SearchNode<B, M>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();

        let mut compacted = Vec::with_capacity(order.len());
        for old_id in &order {
            if let Some(mut node) = old_nodes[old_id.index()].take() {
                node.parent = node
                    .parent
                    .and_then(|p| remap[p.index()])
                    .map(NodeId);
                node.children = node
                    .children
                    .iter()
                    .filter_map(|c| remap[c.index()].map(NodeId))
                    .collect();
                compacted.push(node);
            }
        }

        if let Some(new_root) = compacted.first_mut() {
            new_root.parent = None;
        }
        self.nodes = compacted;
        self.root = NodeId(0);
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::{ChildSpec, SearchTree};

    fn spec(mv: u8, board: u32, prior: f32) -> ChildSpec<u32, u8> {
        ChildSpec { mv, board, prior }
    }

    #[test]
    fn expand_populates_children_once() {
        let mut tree = SearchTree::<u32, u8>::new(0);
        let root = tree.root();
        tree.expand(root, vec![spec(1, 10, 0.6), spec(2, 20, 0.4)])
            .expect("first expansion should succeed");

        assert_eq!(tree.node(root).children().len(), 2);
        assert!(tree.node(root).is_expanded());
        let first = tree.node(root).children()[0];
        assert_eq!(tree.node(first).parent, Some(root));
        assert_eq!(tree.node(first).mv, Some(1));

        assert!(tree.expand(root, vec![spec(3, 30, 1.0)]).is_err());
        assert_eq!(tree.node(root).children().len(), 2);
    }

    #[test]
    fn record_visit_tracks_mean_value() {
        let mut tree = SearchTree::<u32, u8>::new(0);
        let root = tree.root();
        assert_eq!(tree.node(root).value_estimate(), 0.0);

        tree.record_visit(root, 1.0);
        tree.record_visit(root, 0.0);
        tree.record_visit(root, -0.5);
        assert_eq!(tree.node(root).visit_count(), 3);
        assert!((tree.node(root).value_estimate() - 0.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn promote_keeps_subtree_statistics_and_drops_siblings() {
        let mut tree = SearchTree::<u32, u8>::new(0);
        let root = tree.root();
        tree.expand(root, vec![spec(1, 10, 0.5), spec(2, 20, 0.5)])
            .expect("root expansion should succeed");
        let kept = tree.node(root).children()[1];
        let dropped = tree.node(root).children()[0];
        tree.expand(dropped, vec![spec(7, 17, 1.0)])
            .expect("sibling expansion should succeed");
        tree.expand(kept, vec![spec(3, 23, 0.3), spec(4, 24, 0.7)])
            .expect("kept expansion should succeed");
        for _ in 0..4 {
            tree.record_visit(kept, -0.25);
        }
        let grandchild = tree.node(kept).children()[1];
        tree.record_visit(grandchild, 0.5);
        assert_eq!(tree.len(), 6);

        let new_root = tree.promote(kept);

        assert_eq!(tree.len(), 3);
        let node = tree.node(new_root);
        assert_eq!(node.board, 20);
        assert_eq!(node.parent, None);
        assert_eq!(node.visit_count(), 4);
        assert!((node.value_estimate() + 0.25).abs() < 1e-9);

        let boards: Vec<u32> = node.children().iter().map(|c| tree.node(*c).board).collect();
        assert_eq!(boards, vec![23, 24]);
        let moved = node.children()[1];
        assert_eq!(tree.node(moved).visit_count(), 1);
        assert_eq!(tree.node(moved).parent, Some(new_root));
    }

    #[test]
    fn finds_children_by_board() {
        let mut tree = SearchTree::<u32, u8>::new(0);
        let root = tree.root();
        tree.expand(root, vec![spec(1, 10, 0.5), spec(2, 20, 0.5)])
            .expect("root expansion should succeed");
        let child = tree
            .find_child_by_board(root, &20)
            .expect("board 20 should be a child");
        tree.expand(child, vec![spec(5, 25, 1.0)])
            .expect("child expansion should succeed");
        let leaf = tree.node(child).children()[0];

        assert_eq!(tree.find_child_by_board(root, &99), None);
        assert_eq!(tree.find_child_by_board(child, &25), Some(leaf));
        assert_eq!(tree.node(leaf).parent, Some(child));
    }
}
