//! Hierarchy navigation and traversal over arena keys

use std::collections::{HashSet, VecDeque};

use crate::tree::node::NodeKey;

/// Parent/child navigation over a forest of nodes
///
/// Implementors only provide the basic links; ancestry and traversal helpers
/// are derived from them.
pub(crate) trait Hierarchy {
    /// Root-level nodes, in sibling order
    fn roots(&self) -> &[NodeKey];

    /// Parent of a node
    ///
    /// Returns `None` for root-level nodes and stale keys.
    fn parent(&self, key: NodeKey) -> Option<NodeKey>;

    /// Children of a node, in sibling order
    ///
    /// Returns an empty slice for leaves and stale keys.
    fn children(&self, key: NodeKey) -> &[NodeKey];

    /// Sibling list containing `key`: its parent's children or the roots
    fn siblings(&self, key: NodeKey) -> &[NodeKey] {
        match self.parent(key) {
            Some(parent) => self.children(parent),
            None => self.roots(),
        }
    }

    /// All ancestors of a node, from parent to root
    fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(key);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.parent(parent);
        }
        ancestors
    }

    /// All descendants of a node in pre-order, excluding the node itself
    fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        Walker::new(self, self.children(key).to_vec(), TraversalOrder::PreOrder).collect()
    }

    /// Check if a node is an ancestor of another
    fn is_ancestor_of(&self, ancestor: NodeKey, descendant: NodeKey) -> bool {
        let mut current = self.parent(descendant);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }
}

/// Traversal order for walking the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Visit parent before children (render order)
    PreOrder,
    /// Visit children before parent (bottom-up)
    PostOrder,
    /// Visit level by level
    BreadthFirst,
}

/// Iterator walking one or more subtrees in a given order
pub(crate) struct Walker<'a, H: Hierarchy + ?Sized> {
    hierarchy: &'a H,
    order: TraversalOrder,
    stack: Vec<NodeKey>,
    queue: VecDeque<NodeKey>,
    visited: HashSet<NodeKey>,
}

impl<'a, H: Hierarchy + ?Sized> Walker<'a, H> {
    /// Walk the subtrees rooted at `starts`, in sibling order
    pub(crate) fn new(hierarchy: &'a H, starts: Vec<NodeKey>, order: TraversalOrder) -> Self {
        let (stack, queue) = match order {
            TraversalOrder::BreadthFirst => (Vec::new(), starts.into_iter().collect()),
            _ => (starts.into_iter().rev().collect(), VecDeque::new()),
        };
        Self {
            hierarchy,
            order,
            stack,
            queue,
            visited: HashSet::new(),
        }
    }

    fn next_preorder(&mut self) -> Option<NodeKey> {
        let current = self.stack.pop()?;
        // Reversed so the first child is popped first
        self.stack
            .extend(self.hierarchy.children(current).iter().rev().copied());
        Some(current)
    }

    fn next_postorder(&mut self) -> Option<NodeKey> {
        while let Some(&current) = self.stack.last() {
            if self.visited.contains(&current) {
                self.stack.pop();
                return Some(current);
            }
            self.visited.insert(current);
            self.stack
                .extend(self.hierarchy.children(current).iter().rev().copied());
        }
        None
    }

    fn next_breadthfirst(&mut self) -> Option<NodeKey> {
        let current = self.queue.pop_front()?;
        self.queue.extend(self.hierarchy.children(current).iter().copied());
        Some(current)
    }
}

impl<H: Hierarchy + ?Sized> Iterator for Walker<'_, H> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            TraversalOrder::PreOrder => self.next_preorder(),
            TraversalOrder::PostOrder => self.next_postorder(),
            TraversalOrder::BreadthFirst => self.next_breadthfirst(),
        }
    }
}
