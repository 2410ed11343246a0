//! Slot storage for the nodes of one tree

use crate::tree::data::NodeData;
use crate::tree::node::{Node, NodeKey};
use crate::tree::traits::Hierarchy;

/// Owns every node of a tree plus the ordered root list
///
/// Children are referenced by key, parents by an optional key written by the
/// indexer, so no node is ever owned twice.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Option<Node>>,
    roots: Vec<NodeKey>,
}

impl Arena {
    pub(crate) fn get(&self, key: NodeKey) -> Option<&Node> {
        self.slots.get(key.get())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.slots.get_mut(key.get())?.as_mut()
    }

    /// Build the subtree described by `data` and return its top node
    ///
    /// The new subtree is not linked anywhere; callers place the returned key
    /// into a sibling list.
    pub(crate) fn insert(&mut self, mut data: NodeData) -> NodeKey {
        let children = data.nodes.take();
        let top = self.alloc(Node::from_data(data));

        let mut pending: Vec<(NodeData, NodeKey)> = children
            .into_iter()
            .flatten()
            .rev()
            .map(|child| (child, top))
            .collect();

        while let Some((mut data, parent)) = pending.pop() {
            let children = data.nodes.take();
            let key = self.alloc(Node::from_data(data));
            if let Some(parent) = self.get_mut(parent) {
                parent.children.push(key);
            }
            pending.extend(children.into_iter().flatten().rev().map(|child| (child, key)));
        }

        top
    }

    /// Free the slots of `key` and its whole subtree
    pub(crate) fn release(&mut self, key: NodeKey) {
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            if let Some(node) = self.slots.get_mut(key.get()).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
    }

    /// Mutable sibling list: a node's children, or the roots for `None`
    pub(crate) fn sibling_list_mut(
        &mut self,
        parent: Option<NodeKey>,
    ) -> Option<&mut Vec<NodeKey>> {
        match parent {
            Some(parent) => self.get_mut(parent).map(|node| &mut node.children),
            None => Some(&mut self.roots),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.roots.clear();
    }

    /// Description of the subtree rooted at `key`
    pub(crate) fn export(&self, key: NodeKey) -> Option<NodeData> {
        let node = self.get(key)?;
        let mut data = node.to_data();
        if node.has_children() {
            data.nodes = Some(
                node.children
                    .iter()
                    .filter_map(|&child| self.export(child))
                    .collect(),
            );
        }
        Some(data)
    }

    fn alloc(&mut self, node: Node) -> NodeKey {
        let key = NodeKey(self.slots.len());
        self.slots.push(Some(node));
        key
    }
}

impl Hierarchy for Arena {
    fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key)?.parent
    }

    fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }
}
