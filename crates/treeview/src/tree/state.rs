//! State mutators and their cascades
//!
//! Every public mutator takes node identities and a [`StateOptions`]; the
//! key-level helpers below hold the actual transition rules. A mutator that
//! would not change anything is a silent no-op unless `force` is set.

use log::{debug, warn};

use crate::tree::event::Event;
use crate::tree::node::{CheckState, NodeId, NodeKey};
use crate::tree::options::StateOptions;
use crate::tree::structure::Tree;
use crate::tree::traits::Hierarchy;

impl Tree {
    // ---------------------------------------------------------------------
    // Expansion
    // ---------------------------------------------------------------------

    pub(crate) fn set_expanded_key(&mut self, key: NodeKey, expanded: bool, options: StateOptions) {
        let Some(node) = self.arena.get(key) else {
            return;
        };
        if node.is_expanded() == expanded && !options.force {
            return;
        }

        if !expanded {
            self.collapse_key(key, options);
            return;
        }

        if node.is_lazy() && self.lazy_loader.is_some() {
            self.run_lazy_loader(key, options);
            return;
        }
        if !node.has_children() {
            return;
        }

        let children = self.arena.children(key).to_vec();
        if let Some(node) = self.arena.get_mut(key) {
            node.state.expanded = Some(true);
        }
        self.reconcile(key);
        for child in children {
            if let Some(node) = self.arena.get_mut(child) {
                node.state.visible = true;
            }
            self.reconcile(child);
        }
        self.notify_node(key, options.silent, Event::NodeExpanded);
    }

    // Collapsing hides and collapses the whole subtree
    fn collapse_key(&mut self, key: NodeKey, options: StateOptions) {
        if let Some(node) = self.arena.get_mut(key) {
            node.state.expanded = Some(false);
        }
        self.reconcile(key);

        let mut collapsed = Vec::new();
        for descendant in self.arena.descendants(key) {
            if let Some(node) = self.arena.get_mut(descendant) {
                if node.is_expanded() {
                    collapsed.push(descendant);
                }
                node.state.visible = false;
                node.state.expanded = Some(false);
            }
            self.reconcile(descendant);
        }

        self.notify_node(key, options.silent, Event::NodeCollapsed);
        for descendant in collapsed {
            self.notify_node(descendant, options.silent, Event::NodeCollapsed);
        }
    }

    /// Fetch the children of a lazy node and insert them, which expands it
    fn run_lazy_loader(&mut self, key: NodeKey, options: StateOptions) {
        let Some(mut loader) = self.lazy_loader.take() else {
            return;
        };
        let Some(node) = self.arena.get_mut(key) else {
            self.lazy_loader = Some(loader);
            return;
        };
        node.lazy_load = false;
        let id = node.id().clone();
        let result = loader.load_children(node);
        self.lazy_loader = Some(loader);

        match result {
            Ok(children) if children.is_empty() => {
                debug!("lazy loader returned no children for {}", id);
            }
            Ok(children) => {
                debug!("lazy loaded {} children for {}", children.len(), id);
                self.insert_nodes(children, Some(key), None, options);
            }
            Err(err) => {
                warn!("lazy loading children of {} failed: {:#}", id, err);
                if let Some(node) = self.arena.get_mut(key) {
                    node.lazy_load = true;
                }
            }
        }
    }

    /// Expand `key` and `levels - 1` levels below it, collapsing anything deeper
    pub(crate) fn expand_levels(&mut self, key: NodeKey, levels: usize, options: StateOptions) {
        let mut pending = vec![(key, levels)];
        while let Some((key, levels)) = pending.pop() {
            self.set_expanded_key(key, levels > 0, options);
            if levels == 0 {
                continue;
            }
            pending.extend(
                self.arena
                    .children(key)
                    .iter()
                    .rev()
                    .map(|&child| (child, levels - 1)),
            );
        }
    }

    /// Expand every ancestor of `key`, top-down, so the node becomes visible
    pub(crate) fn reveal_key(&mut self, key: NodeKey, options: StateOptions) {
        for ancestor in self.arena.ancestors(key).into_iter().rev() {
            self.set_expanded_key(ancestor, true, options);
        }
    }

    /// Expand the given nodes and `levels - 1` levels of their descendants
    pub fn expand_nodes(&mut self, ids: &[NodeId], levels: usize, options: StateOptions) {
        for key in self.keys_of(ids) {
            self.expand_levels(key, levels.max(1), options);
        }
    }

    pub fn collapse_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_expanded_key(key, false, options);
        }
    }

    pub fn toggle_expanded(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            let expanded = self.arena.get(key).is_some_and(|node| node.is_expanded());
            self.set_expanded_key(key, !expanded, options);
        }
    }

    /// Expand `levels` levels from the roots down
    ///
    /// Pass [`EXPAND_ALL_LEVELS`](crate::tree::EXPAND_ALL_LEVELS) to open everything.
    pub fn expand_all(&mut self, levels: usize, options: StateOptions) {
        for root in self.arena.roots().to_vec() {
            self.expand_levels(root, levels, options);
        }
    }

    pub fn collapse_all(&mut self, options: StateOptions) {
        for key in self.keys_where(|node| node.is_expanded()) {
            self.set_expanded_key(key, false, options);
        }
    }

    /// Expand the ancestors of the given nodes
    pub fn reveal_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.reveal_key(key, options);
        }
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub(crate) fn set_selected_key(&mut self, key: NodeKey, selected: bool, options: StateOptions) {
        let Some(node) = self.arena.get(key) else {
            return;
        };
        if node.is_selected() == selected && !options.force {
            return;
        }

        if selected {
            if !node.is_selectable() {
                debug!("{} is not selectable", node);
                return;
            }
            if !self.options.multi_select {
                let others = self.keys_where(|other| other.is_selected());
                for other in others.into_iter().filter(|&other| other != key) {
                    self.set_selected_key(other, false, options.unselecting());
                }
            }
            if let Some(node) = self.arena.get_mut(key) {
                node.state.selected = true;
            }
            self.reconcile(key);
            self.notify_node(key, options.silent, Event::NodeSelected);
            return;
        }

        if self.options.prevent_unselect
            && !options.unselecting
            && node.is_selected()
            && self.keys_where(|other| other.is_selected()).len() == 1
        {
            debug!("refusing to unselect the last selected node {}", node);
            if self.options.allow_reselect {
                self.notify_node(key, options.silent, Event::NodeSelected);
            }
            return;
        }

        if let Some(node) = self.arena.get_mut(key) {
            node.state.selected = false;
        }
        self.reconcile(key);
        self.notify_node(key, options.silent, Event::NodeUnselected);
    }

    pub fn select_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_selected_key(key, true, options);
        }
    }

    pub fn unselect_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_selected_key(key, false, options);
        }
    }

    pub fn toggle_selected(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            let selected = self.arena.get(key).is_some_and(|node| node.is_selected());
            self.set_selected_key(key, !selected, options);
        }
    }

    // ---------------------------------------------------------------------
    // Checking
    // ---------------------------------------------------------------------

    pub(crate) fn set_checked_key(
        &mut self,
        key: NodeKey,
        state: CheckState,
        options: StateOptions,
    ) {
        let state = match state {
            CheckState::Partial if !self.options.hierarchical_check => CheckState::Unchecked,
            state => state,
        };
        let Some(node) = self.arena.get_mut(key) else {
            return;
        };
        if node.state.checked == state && !options.force {
            return;
        }
        if state == CheckState::Checked && !node.is_checkable() {
            return;
        }

        node.state.checked = state;
        self.reconcile(key);
        let event = if state.is_checked() {
            Event::NodeChecked
        } else {
            Event::NodeUnchecked
        };
        self.notify_node(key, options.silent, event);
    }

    /// Toggle a node, propagating through the hierarchy in hierarchical mode
    pub(crate) fn toggle_checked_key(&mut self, key: NodeKey, options: StateOptions) {
        let Some(node) = self.arena.get(key) else {
            return;
        };
        let current = node.state.checked;
        let next = current.toggled();
        if !self.options.hierarchical_check {
            self.set_checked_key(key, next, options);
            return;
        }
        if next == CheckState::Checked && !node.is_checkable() {
            return;
        }

        let cascade = if self.options.propagate_check_event {
            options
        } else {
            options.silent(true)
        };

        // Ancestors derive their state from the toggled value
        self.write_check_state(key, next);
        for ancestor in self.arena.ancestors(key) {
            let derived = self.derived_check_state(ancestor);
            self.set_checked_key(ancestor, derived, cascade);
        }
        let mut refused = false;
        for descendant in self.arena.descendants(key) {
            self.set_checked_key(descendant, next, cascade);
            refused |= self
                .arena
                .get(descendant)
                .is_some_and(|node| node.state.checked != next);
        }

        // A descendant that kept its state decides the node's final value
        let settled = if refused {
            self.children_check_state(key).unwrap_or(next)
        } else {
            next
        };
        if settled != next {
            self.write_check_state(key, settled);
            for ancestor in self.arena.ancestors(key) {
                let derived = self.derived_check_state(ancestor);
                self.set_checked_key(ancestor, derived, cascade);
            }
        }
        self.write_check_state(key, current);

        self.set_checked_key(key, settled, options);
    }

    fn write_check_state(&mut self, key: NodeKey, state: CheckState) {
        if let Some(node) = self.arena.get_mut(key) {
            node.state.checked = state;
        }
    }

    /// All children checked, all unchecked, or a mix
    fn derived_check_state(&self, key: NodeKey) -> CheckState {
        self.children_check_state(key).unwrap_or_else(|| {
            self.arena
                .get(key)
                .map(|node| node.state.checked)
                .unwrap_or_default()
        })
    }

    /// Combined state of the checkable children, if there are any
    fn children_check_state(&self, key: NodeKey) -> Option<CheckState> {
        let mut states = self
            .arena
            .children(key)
            .iter()
            .filter_map(|&child| self.arena.get(child))
            .filter(|child| child.is_checkable())
            .map(|child| child.state.checked);
        let first = states.next()?;
        Some(match first {
            CheckState::Partial => CheckState::Partial,
            first if states.all(|state| state == first) => first,
            _ => CheckState::Partial,
        })
    }

    pub fn check_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_checked_key(key, CheckState::Checked, options);
        }
    }

    pub fn uncheck_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_checked_key(key, CheckState::Unchecked, options);
        }
    }

    /// Toggle the given nodes; see the hierarchical rules on
    /// [`TreeOptions::hierarchical_check`](crate::tree::TreeOptions::hierarchical_check)
    pub fn toggle_checked(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.toggle_checked_key(key, options);
        }
    }

    pub fn check_all(&mut self, options: StateOptions) {
        for key in self.keys_where(|node| node.state.checked != CheckState::Checked) {
            self.set_checked_key(key, CheckState::Checked, options);
        }
    }

    pub fn uncheck_all(&mut self, options: StateOptions) {
        for key in self.keys_where(|node| node.state.checked != CheckState::Unchecked) {
            self.set_checked_key(key, CheckState::Unchecked, options);
        }
    }

    // ---------------------------------------------------------------------
    // Disabling
    // ---------------------------------------------------------------------

    pub(crate) fn set_disabled_key(&mut self, key: NodeKey, disabled: bool, options: StateOptions) {
        let Some(node) = self.arena.get_mut(key) else {
            return;
        };
        if node.is_disabled() == disabled && !options.force {
            return;
        }
        node.state.disabled = disabled;

        if disabled && !options.keep_state {
            let cascade = options.force(false);
            self.set_selected_key(key, false, cascade.unselecting());
            self.set_checked_key(key, CheckState::Unchecked, cascade);
            self.set_expanded_key(key, false, cascade);
        }

        self.reconcile(key);
        let event = if disabled {
            Event::NodeDisabled
        } else {
            Event::NodeEnabled
        };
        self.notify_node(key, options.silent, event);
    }

    pub fn disable_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_disabled_key(key, true, options);
        }
    }

    pub fn enable_nodes(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            self.set_disabled_key(key, false, options);
        }
    }

    pub fn toggle_disabled(&mut self, ids: &[NodeId], options: StateOptions) {
        for key in self.keys_of(ids) {
            let disabled = self.arena.get(key).is_some_and(|node| node.is_disabled());
            self.set_disabled_key(key, !disabled, options);
        }
    }

    pub fn disable_all(&mut self, options: StateOptions) {
        for key in self.keys_where(|node| !node.is_disabled()) {
            self.set_disabled_key(key, true, options);
        }
    }

    pub fn enable_all(&mut self, options: StateOptions) {
        for key in self.keys_where(|node| node.is_disabled()) {
            self.set_disabled_key(key, false, options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::data::NodeData;
    use crate::tree::options::{TreeOptions, EXPAND_ALL_LEVELS};
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    fn opts() -> StateOptions {
        StateOptions::default()
    }

    #[test]
    fn test_collapse_hides_subtree() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a")
            .child(NodeData::new("b").child(NodeData::new("c")))]);
        tree.expand_all(EXPAND_ALL_LEVELS, opts());
        assert!(tree.node(&id("0.0.0.0")).unwrap().is_visible());

        let events = tree.subscribe();
        tree.collapse_nodes(&[id("0.0")], opts());

        for node in tree.nodes().into_iter().skip(1) {
            assert!(!node.is_visible());
            assert!(!node.is_expanded());
        }
        let collapsed: Vec<Event> = events.try_iter().collect();
        assert_eq!(
            collapsed,
            vec![Event::NodeCollapsed(id("0.0")), Event::NodeCollapsed(id("0.0.0"))]
        );
    }

    #[test]
    fn test_expand_requires_children() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("leaf")]);
        let events = tree.subscribe();
        tree.expand_nodes(&[id("0.0")], 1, opts());
        assert!(!tree.node(&id("0.0")).unwrap().is_expanded());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_expand_levels_limits_depth() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a")
            .child(NodeData::new("b").child(NodeData::new("c").child(NodeData::new("d"))))]);
        tree.expand_nodes(&[id("0.0")], 2, opts());

        assert!(tree.node(&id("0.0")).unwrap().is_expanded());
        assert!(tree.node(&id("0.0.0")).unwrap().is_expanded());
        assert!(!tree.node(&id("0.0.0.0")).unwrap().is_expanded());
        assert!(tree.node(&id("0.0.0.0")).unwrap().is_visible());
        assert!(!tree.node(&id("0.0.0.0.0")).unwrap().is_visible());
    }

    #[test]
    fn test_lazy_loader_runs_once() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("lazy").lazy()]);
        let mut calls = 0;
        tree.set_lazy_loader(move |node: &crate::tree::Node| -> anyhow::Result<Vec<NodeData>> {
            calls += 1;
            assert_eq!(calls, 1);
            Ok(vec![NodeData::new(format!("{} child", node.text()))])
        });

        tree.expand_nodes(&[id("0.0")], 1, opts());
        let lazy = tree.node(&id("0.0")).unwrap();
        assert!(lazy.is_expanded());
        assert!(!lazy.is_lazy());
        assert_eq!(tree.node(&id("0.0.0")).unwrap().text(), "lazy child");

        tree.collapse_nodes(&[id("0.0")], opts());
        tree.expand_nodes(&[id("0.0")], 1, opts());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_lazy_loader_failure_keeps_node_lazy() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("lazy").lazy()]);
        tree.set_lazy_loader(|_: &crate::tree::Node| -> anyhow::Result<Vec<NodeData>> {
            Err(anyhow!("backend down"))
        });

        tree.expand_nodes(&[id("0.0")], 1, opts());
        let node = tree.node(&id("0.0")).unwrap();
        assert!(node.is_lazy());
        assert!(!node.is_expanded());
    }

    #[test]
    fn test_unselectable_and_uncheckable() {
        let mut tree = Tree::from_nodes(vec![
            NodeData::new("a").selectable(false),
            NodeData::new("b").checkable(false),
        ]);
        tree.select_nodes(&[id("0.0")], opts());
        tree.check_nodes(&[id("0.1")], opts());
        assert!(tree.selected().is_empty());
        assert!(tree.checked().is_empty());
    }

    #[test]
    fn test_partial_outside_hierarchical_mode() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a").checked(true)]);
        tree.set_checked_key(tree.index.ordered()[0], CheckState::Partial, opts());
        assert_eq!(tree.node(&id("0.0")).unwrap().state().checked, CheckState::Unchecked);
    }

    #[test]
    fn test_hierarchical_toggle_on_parent_forces_children() {
        let mut tree = Tree::with_nodes(
            TreeOptions::new().hierarchical_check(true),
            vec![NodeData::new("p")
                .child(NodeData::new("c1").child(NodeData::new("g")))
                .child(NodeData::new("c2"))],
        );
        let events = tree.subscribe();
        tree.toggle_checked(&[id("0.0")], opts());

        assert_eq!(tree.checked().len(), 4);
        // Only the toggled node notifies without propagate_check_event
        assert_eq!(events.try_iter().collect::<Vec<_>>(), vec![Event::NodeChecked(id("0.0"))]);
    }

    #[test]
    fn test_uncheckable_children_do_not_count() {
        let mut tree = Tree::with_nodes(
            TreeOptions::new().hierarchical_check(true),
            vec![NodeData::new("p")
                .child(NodeData::new("a"))
                .child(NodeData::new("b").checkable(false))],
        );
        let states = |tree: &Tree| -> Vec<CheckState> {
            tree.nodes().iter().map(|n| n.state().checked).collect()
        };

        tree.toggle_checked(&[id("0.0")], opts());
        assert_eq!(
            states(&tree),
            vec![CheckState::Checked, CheckState::Checked, CheckState::Unchecked]
        );

        tree.toggle_checked(&[id("0.0.0")], opts());
        assert_eq!(states(&tree), vec![CheckState::Unchecked; 3]);

        tree.toggle_checked(&[id("0.0.0")], opts());
        assert_eq!(tree.node(&id("0.0")).unwrap().state().checked, CheckState::Checked);
    }

    #[test]
    fn test_disable_force_reemits() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a").disabled(true)]);
        let events = tree.subscribe();
        tree.disable_nodes(&[id("0.0")], opts());
        assert!(events.try_recv().is_err());

        tree.disable_nodes(&[id("0.0")], opts().force(true));
        assert_eq!(events.try_recv().unwrap(), Event::NodeDisabled(id("0.0")));
    }
}
