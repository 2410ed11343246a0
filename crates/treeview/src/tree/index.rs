//! Hierarchy indexing and the flat, render-ordered node index

use std::collections::HashMap;

use log::trace;

use crate::tree::arena::Arena;
use crate::tree::node::{CheckState, NodeId, NodeKey};
use crate::tree::traits::Hierarchy;

/// Tree-wide settings the indexer applies to every node
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexRules {
    pub(crate) levels: usize,
    pub(crate) hierarchical_check: bool,
}

/// Identity lookup plus the render-ordered view of every indexed node
#[derive(Debug, Default)]
pub(crate) struct FlatIndex {
    by_id: HashMap<NodeId, NodeKey>,
    ordered: Vec<NodeKey>,
}

impl FlatIndex {
    pub(crate) fn get(&self, id: &NodeId) -> Option<NodeKey> {
        self.by_id.get(id).copied()
    }

    /// Keys in render order
    pub(crate) fn ordered(&self) -> &[NodeKey] {
        &self.ordered
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Re-index the whole forest and rebuild the render order
    ///
    /// # Panics
    ///
    /// Panics if two nodes end up with the same identity.
    pub(crate) fn rebuild(&mut self, arena: &mut Arena, rules: IndexRules) {
        self.by_id.clear();
        index_forest(arena, rules, &mut self.by_id);

        let mut entries: Vec<(&NodeId, NodeKey)> =
            self.by_id.iter().map(|(id, &key)| (id, key)).collect();
        entries.sort_unstable_by(|a, b| a.0.compare(b.0));
        for pair in entries.windows(2) {
            assert!(
                pair[0].0 < pair[1].0,
                "node ids out of order: {} before {}",
                pair[0].0,
                pair[1].0
            );
        }
        self.ordered = entries.into_iter().map(|(_, key)| key).collect();
        trace!("indexed {} nodes", self.ordered.len());
    }
}

struct Pending {
    key: NodeKey,
    index: usize,
    parent: Option<NodeKey>,
    parent_id: NodeId,
    parent_level: usize,
    parent_expanded: bool,
}

/// Assign identity, level, default expansion and visibility in pre-order
///
/// Starts at the virtual root (level 0, always expanded), whose children are
/// the root-level nodes.
fn index_forest(arena: &mut Arena, rules: IndexRules, registry: &mut HashMap<NodeId, NodeKey>) {
    let virtual_root = NodeId::virtual_root();
    let mut stack: Vec<Pending> = arena
        .roots()
        .iter()
        .enumerate()
        .rev()
        .map(|(index, &key)| Pending {
            key,
            index,
            parent: None,
            parent_id: virtual_root.clone(),
            parent_level: 0,
            parent_expanded: true,
        })
        .collect();

    while let Some(entry) = stack.pop() {
        let Some(node) = arena.get_mut(entry.key) else {
            continue;
        };

        let level = entry.parent_level + 1;
        node.parent = entry.parent;
        node.index = entry.index;
        node.level = level;
        node.id = entry.parent_id.child(entry.index);

        if !rules.hierarchical_check && node.state.checked == CheckState::Partial {
            node.state.checked = CheckState::Unchecked;
        }
        if node.state.expanded.is_none() {
            node.state.expanded =
                Some(!node.state.disabled && level < rules.levels && node.has_children());
        }
        node.state.visible = entry.parent_expanded || level <= rules.levels;

        let id = node.id.clone();
        let expanded = node.is_expanded();
        stack.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, &key)| Pending {
                    key,
                    index,
                    parent: Some(entry.key),
                    parent_id: id.clone(),
                    parent_level: level,
                    parent_expanded: expanded,
                }),
        );

        if let Some(previous) = registry.insert(id.clone(), entry.key) {
            panic!("node id {} assigned twice ({:?})", id, previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::data::NodeData;
    use pretty_assertions::assert_eq;

    fn build(data: Vec<NodeData>, levels: usize) -> (Arena, FlatIndex) {
        let mut arena = Arena::default();
        for node in data {
            let key = arena.insert(node);
            if let Some(roots) = arena.sibling_list_mut(None) {
                roots.push(key);
            }
        }
        let mut index = FlatIndex::default();
        index.rebuild(
            &mut arena,
            IndexRules {
                levels,
                hierarchical_check: false,
            },
        );
        (arena, index)
    }

    fn ids(arena: &Arena, index: &FlatIndex) -> Vec<String> {
        index
            .ordered()
            .iter()
            .map(|&key| arena.get(key).unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn test_parent_with_two_children_default_depth() {
        let data = vec![NodeData::new("P")
            .child(NodeData::new("C1"))
            .child(NodeData::new("C2"))];
        let (arena, index) = build(data, 1);

        assert_eq!(ids(&arena, &index), vec!["0.0", "0.0.0", "0.0.1"]);

        let p = arena.get(index.ordered()[0]).unwrap();
        assert_eq!(p.level(), 1);
        assert_eq!(p.state().expanded, Some(false));
        assert!(p.is_visible());

        for &key in &index.ordered()[1..] {
            let child = arena.get(key).unwrap();
            assert_eq!(child.level(), 2);
            assert!(!child.is_visible());
        }
    }

    #[test]
    fn test_deeper_levels_expand_and_show() {
        let data = vec![NodeData::new("P").child(NodeData::new("C").child(NodeData::new("G")))];
        let (arena, index) = build(data, 2);

        let nodes: Vec<_> = index
            .ordered()
            .iter()
            .map(|&key| arena.get(key).unwrap())
            .collect();
        assert!(nodes[0].is_expanded());
        // Level 2 is not below the depth limit, so it stays collapsed
        assert_eq!(nodes[1].state().expanded, Some(false));
        assert!(nodes[1].is_visible());
        assert!(!nodes[2].is_visible());
    }

    #[test]
    fn test_explicit_state_is_kept() {
        let data = vec![
            NodeData::new("open")
                .expanded(true)
                .child(NodeData::new("shown")),
            NodeData::new("off")
                .disabled(true)
                .partially_checked()
                .child(NodeData::new("hidden")),
        ];
        let (arena, index) = build(data, 5);

        let get = |id: &str| arena.get(index.get(&id.parse().unwrap()).unwrap()).unwrap();
        assert!(get("0.0").is_expanded());
        assert!(get("0.0.0").is_visible());
        // Disabled nodes never auto-expand, their children stay visible by depth
        assert_eq!(get("0.1").state().expanded, Some(false));
        assert!(get("0.1.0").is_visible());
        assert_eq!(get("0.1").state().checked, CheckState::Unchecked);
    }

    #[test]
    fn test_sort_is_numeric_not_lexical() {
        let data = (0..12).map(|i| NodeData::new(format!("n{i}"))).collect();
        let (arena, index) = build(data, 1);

        let ids = ids(&arena, &index);
        assert_eq!(ids[2], "0.2");
        assert_eq!(ids[10], "0.10");
        assert_eq!(index.len(), 12);
    }
}
