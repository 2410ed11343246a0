//! The tree: node ownership, indexing, queries and structural mutation

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};

use crate::render::Renderer;
use crate::tree::arena::Arena;
use crate::tree::data::{DataFetcher, LazyLoader, NodeData};
use crate::tree::event::{Event, EventBus};
use crate::tree::index::{FlatIndex, IndexRules};
use crate::tree::node::{CheckState, Node, NodeId, NodeKey};
use crate::tree::options::{StateOptions, TreeOptions};
use crate::tree::traits::{Hierarchy, TraversalOrder, Walker};

/// A hierarchical list of nodes and the rules that keep its state consistent
///
/// The tree owns every node. Nodes are addressed from the outside by their
/// [`NodeId`], which is reassigned by every structural mutation
/// ([`add_nodes`](Tree::add_nodes), [`remove_nodes`](Tree::remove_nodes),
/// [`update_node`](Tree::update_node)). State mutators never renumber nodes.
///
/// # Example
///
/// ```
/// use treeview::prelude::*;
///
/// let mut tree = Tree::from_nodes(vec![
///     NodeData::new("P").child(NodeData::new("C1")).child(NodeData::new("C2")),
/// ]);
/// let parent: NodeId = "0.0".parse().unwrap();
///
/// assert!(!tree.node(&parent).unwrap().is_expanded());
/// tree.expand_nodes(&[parent.clone()], 1, StateOptions::default());
/// assert_eq!(tree.children(&parent).len(), 2);
/// assert!(tree.children(&parent).iter().all(|child| child.is_visible()));
/// ```
pub struct Tree {
    pub(super) options: TreeOptions,
    pub(super) arena: Arena,
    pub(super) index: FlatIndex,
    /// Checked nodes at the last save point
    pub(super) checked_baseline: HashSet<NodeKey>,
    /// Current search matches, in render order
    pub(super) search_results: Vec<NodeKey>,
    pub(super) initialized: bool,
    pub(super) renderer: Option<Box<dyn Renderer>>,
    pub(super) lazy_loader: Option<Box<dyn LazyLoader>>,
    pub(super) fetcher: Option<Box<dyn DataFetcher>>,
    pub(super) events: EventBus,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("options", &self.options)
            .field("nodes", &self.index.len())
            .field("search_results", &self.search_results.len())
            .field("initialized", &self.initialized)
            .field("renderer", &self.renderer.is_some())
            .field("lazy_loader", &self.lazy_loader.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(TreeOptions::default())
    }
}

impl Tree {
    /// Create an empty, uninitialized tree
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            arena: Arena::default(),
            index: FlatIndex::default(),
            checked_baseline: HashSet::new(),
            search_results: Vec::new(),
            initialized: false,
            renderer: None,
            lazy_loader: None,
            fetcher: None,
            events: EventBus::default(),
        }
    }

    /// Build an initialized tree from descriptions with default options
    pub fn from_nodes(nodes: Vec<NodeData>) -> Self {
        Self::with_nodes(TreeOptions::default(), nodes)
    }

    /// Build an initialized tree from descriptions
    pub fn with_nodes(options: TreeOptions, nodes: Vec<NodeData>) -> Self {
        let mut tree = Self::new(options);
        tree.replace_roots(nodes);
        tree
    }

    /// Install the renderer and draw the current state
    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
        if self.initialized {
            self.render();
        }
    }

    /// Install the collaborator supplying children of lazy nodes
    pub fn set_lazy_loader(&mut self, loader: impl LazyLoader + 'static) {
        self.lazy_loader = Some(Box::new(loader));
    }

    /// Install the collaborator fetching remote data sources
    pub fn set_fetcher(&mut self, fetcher: impl DataFetcher + 'static) {
        self.fetcher = Some(Box::new(fetcher));
    }

    /// Receive every notification raised from now on
    pub fn subscribe(&mut self) -> flume::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Returns true once data has been loaded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Look up a node by identity
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.key_of(id).and_then(|key| self.arena.get(key))
    }

    /// Returns true if a node with this identity exists
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.get(id).is_some()
    }

    /// Every node, in render order
    pub fn nodes(&self) -> Vec<&Node> {
        self.resolve(self.index.ordered())
    }

    /// Root-level nodes, in sibling order
    pub fn root_nodes(&self) -> Vec<&Node> {
        self.resolve(self.arena.roots())
    }

    /// Children of a node, in sibling order
    pub fn children(&self, id: &NodeId) -> Vec<&Node> {
        match self.key_of(id) {
            Some(key) => self.resolve(self.arena.children(key)),
            None => Vec::new(),
        }
    }

    /// Parent of a node, `None` for root-level nodes
    pub fn parent(&self, id: &NodeId) -> Option<&Node> {
        let key = self.key_of(id)?;
        self.arena.get(self.arena.parent(key)?)
    }

    /// Distinct parents of the given nodes, in order of first appearance
    pub fn parents(&self, ids: &[NodeId]) -> Vec<&Node> {
        let mut seen = HashSet::new();
        let parents: Vec<NodeKey> = self
            .keys_of(ids)
            .into_iter()
            .filter_map(|key| self.arena.parent(key))
            .filter(|&parent| seen.insert(parent))
            .collect();
        self.resolve(&parents)
    }

    /// Siblings of each given node, excluding the node itself
    pub fn siblings(&self, ids: &[NodeId]) -> Vec<&Node> {
        let siblings: Vec<NodeKey> = self
            .keys_of(ids)
            .into_iter()
            .flat_map(|key| {
                self.arena
                    .siblings(key)
                    .iter()
                    .copied()
                    .filter(move |&sibling| sibling != key)
            })
            .collect();
        self.resolve(&siblings)
    }

    /// Ancestors of a node, from parent to root
    pub fn ancestors(&self, id: &NodeId) -> Vec<&Node> {
        match self.key_of(id) {
            Some(key) => self.resolve(&self.arena.ancestors(key)),
            None => Vec::new(),
        }
    }

    /// Walk every node in the given order
    pub fn walk(&self, order: TraversalOrder) -> impl Iterator<Item = &Node> + '_ {
        Walker::new(&self.arena, self.arena.roots().to_vec(), order)
            .filter_map(|key| self.arena.get(key))
    }

    pub fn selected(&self) -> Vec<&Node> {
        self.filter_nodes(|node| node.is_selected())
    }

    pub fn unselected(&self) -> Vec<&Node> {
        self.filter_nodes(|node| !node.is_selected())
    }

    pub fn expanded(&self) -> Vec<&Node> {
        self.filter_nodes(|node| node.is_expanded())
    }

    pub fn collapsed(&self) -> Vec<&Node> {
        self.filter_nodes(|node| !node.is_expanded())
    }

    pub fn checked(&self) -> Vec<&Node> {
        self.filter_nodes(|node| node.is_checked())
    }

    /// Nodes that are not fully checked (partial included)
    pub fn unchecked(&self) -> Vec<&Node> {
        self.filter_nodes(|node| !node.is_checked())
    }

    pub fn disabled(&self) -> Vec<&Node> {
        self.filter_nodes(|node| node.is_disabled())
    }

    pub fn enabled(&self) -> Vec<&Node> {
        self.filter_nodes(|node| !node.is_disabled())
    }

    /// Matches of the current search, in render order
    pub fn search_results(&self) -> Vec<&Node> {
        self.resolve(&self.search_results)
    }

    /// Nodes whose checked flag differs from the last save point
    pub fn changed_nodes(&self) -> Vec<&Node> {
        self.index
            .ordered()
            .iter()
            .filter_map(|key| {
                let node = self.arena.get(*key)?;
                (node.is_checked() != self.checked_baseline.contains(key)).then_some(node)
            })
            .collect()
    }

    /// Record the current checked nodes as the new save point
    pub fn mark_checked_changes_saved(&mut self) {
        self.checked_baseline = self.checked_keys();
    }

    /// Descriptions of the whole tree, including current state
    pub fn export(&self) -> Vec<NodeData> {
        self.arena
            .roots()
            .iter()
            .filter_map(|&key| self.arena.export(key))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Structural mutation
    // ---------------------------------------------------------------------

    /// Insert descriptions under `parent` (or at root level) at `index`
    ///
    /// Appends when `index` is `None` or past the end. The parent is expanded
    /// afterwards. Returns the identities of the inserted nodes.
    pub fn add_nodes(
        &mut self,
        nodes: Vec<NodeData>,
        parent: Option<&NodeId>,
        index: Option<usize>,
        options: StateOptions,
    ) -> Vec<NodeId> {
        let parent = match parent {
            Some(id) => match self.key_of(id) {
                Some(key) => Some(key),
                None => return Vec::new(),
            },
            None => None,
        };
        self.insert_nodes(nodes, parent, index, options)
    }

    pub(crate) fn insert_nodes(
        &mut self,
        nodes: Vec<NodeData>,
        parent: Option<NodeKey>,
        index: Option<usize>,
        options: StateOptions,
    ) -> Vec<NodeId> {
        let keys: Vec<NodeKey> = nodes.into_iter().map(|data| self.arena.insert(data)).collect();
        let Some(siblings) = self.arena.sibling_list_mut(parent) else {
            warn!("cannot insert under a removed node");
            for key in keys {
                self.arena.release(key);
            }
            return Vec::new();
        };
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.splice(at..at, keys.iter().copied());

        if let Some(node) = parent.and_then(|key| self.arena.get_mut(key)) {
            node.lazy_load = false;
        }
        self.rebuild_index();

        let ids = self.ids_of(&keys);
        debug!("inserted {} nodes", ids.len());
        if let Some(parent) = parent {
            if self.arena.get(parent).is_some_and(|node| !node.is_expanded()) {
                self.set_expanded_key(parent, true, options);
            }
        }
        ids
    }

    /// Detach the given nodes with their whole subtrees
    ///
    /// Returns the descriptions of the removed subtrees.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeData> {
        let keys: HashSet<NodeKey> = self.keys_of(ids).into_iter().collect();
        // Nodes inside an already removed subtree go with it
        let mut tops: Vec<NodeKey> = keys
            .iter()
            .copied()
            .filter(|&key| !keys.iter().any(|&other| self.arena.is_ancestor_of(other, key)))
            .collect();
        tops.sort_unstable_by(|a, b| self.compare_keys(*a, *b));

        let mut removed = Vec::with_capacity(tops.len());
        for key in tops {
            let parent = self.arena.parent(key);
            if let Some(siblings) = self.arena.sibling_list_mut(parent) {
                if let Some(position) = siblings.iter().position(|&sibling| sibling == key) {
                    siblings.remove(position);
                }
            }
            removed.extend(self.arena.export(key));
            self.arena.release(key);
        }

        if !removed.is_empty() {
            debug!("removed {} subtrees", removed.len());
            self.rebuild_index();
        }
        removed
    }

    /// Replace a node (and its subtree) with a new description in place
    ///
    /// Returns the identity of the replacement.
    pub fn update_node(&mut self, id: &NodeId, node: NodeData) -> Option<NodeId> {
        let old = self.key_of(id)?;
        let parent = self.arena.parent(old);
        let new = self.arena.insert(node);

        let replaced = self
            .arena
            .sibling_list_mut(parent)
            .and_then(|siblings| {
                let position = siblings.iter().position(|&sibling| sibling == old)?;
                siblings[position] = new;
                Some(())
            })
            .is_some();
        if !replaced {
            self.arena.release(new);
            return None;
        }

        self.arena.release(old);
        self.rebuild_index();
        self.arena.get(new).map(|node| node.id().clone())
    }

    /// Re-index every node, rebuild the render order and redraw
    ///
    /// # Panics
    ///
    /// Panics if the hierarchy produces duplicate identities.
    pub fn rebuild_index(&mut self) {
        let rules = IndexRules {
            levels: self.options.levels,
            hierarchical_check: self.options.hierarchical_check,
        };
        self.index.rebuild(&mut self.arena, rules);
        self.checked_baseline = self.checked_keys();

        let arena = &self.arena;
        self.search_results = self
            .index
            .ordered()
            .iter()
            .copied()
            .filter(|&key| arena.get(key).is_some_and(|node| node.is_search_result()))
            .collect();

        self.render();
    }

    /// Hand the render-ordered nodes to the renderer
    pub fn render(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            let nodes: Vec<&Node> = self
                .index
                .ordered()
                .iter()
                .filter_map(|&key| self.arena.get(key))
                .collect();
            renderer.render(&nodes);
        }

        if self.events.has_subscribers() {
            let ids = self.ids_of(self.index.ordered());
            for id in &ids {
                self.events.emit(Event::NodeRendered(id.clone()));
            }
            self.events.emit(Event::Rendered { nodes: ids });
        }
    }

    // ---------------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------------

    /// Drop every node and build the given descriptions as the new roots
    pub(crate) fn replace_roots(&mut self, nodes: Vec<NodeData>) {
        self.arena.clear();
        for data in nodes {
            let key = self.arena.insert(data);
            if let Some(roots) = self.arena.sibling_list_mut(None) {
                roots.push(key);
            }
        }
        self.search_results.clear();
        self.rebuild_index();
        self.initialized = true;
    }

    /// Resolve an identity, logging a miss
    pub(crate) fn key_of(&self, id: &NodeId) -> Option<NodeKey> {
        let key = self.index.get(id);
        if key.is_none() {
            warn!("no node with id {}", id);
        }
        key
    }

    pub(crate) fn keys_of(&self, ids: &[NodeId]) -> Vec<NodeKey> {
        ids.iter().filter_map(|id| self.key_of(id)).collect()
    }

    pub(crate) fn ids_of(&self, keys: &[NodeKey]) -> Vec<NodeId> {
        keys.iter()
            .filter_map(|&key| self.arena.get(key))
            .map(|node| node.id().clone())
            .collect()
    }

    pub(crate) fn resolve(&self, keys: &[NodeKey]) -> Vec<&Node> {
        keys.iter().filter_map(|&key| self.arena.get(key)).collect()
    }

    /// Keys of every node matching `predicate`, in render order
    pub(crate) fn keys_where(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeKey> {
        self.index
            .ordered()
            .iter()
            .copied()
            .filter(|&key| self.arena.get(key).is_some_and(&predicate))
            .collect()
    }

    fn filter_nodes(&self, predicate: impl Fn(&Node) -> bool) -> Vec<&Node> {
        self.resolve(&self.keys_where(predicate))
    }

    fn checked_keys(&self) -> HashSet<NodeKey> {
        self.keys_where(|node| node.state.checked == CheckState::Checked)
            .into_iter()
            .collect()
    }

    fn compare_keys(&self, a: NodeKey, b: NodeKey) -> std::cmp::Ordering {
        match (self.arena.get(a), self.arena.get(b)) {
            (Some(a), Some(b)) => a.id().compare(b.id()),
            _ => a.cmp(&b),
        }
    }

    /// Send `event` unless silenced
    pub(crate) fn notify(&mut self, silent: bool, event: Event) {
        if !silent {
            self.events.emit(event);
        }
    }

    /// Send the per-node event built by `make` unless silenced
    pub(crate) fn notify_node(&mut self, key: NodeKey, silent: bool, make: fn(NodeId) -> Event) {
        if silent {
            return;
        }
        if let Some(node) = self.arena.get(key) {
            let event = make(node.id().clone());
            self.events.emit(event);
        }
    }

    /// Let the renderer redraw a single node
    pub(crate) fn reconcile(&mut self, key: NodeKey) {
        if let (Some(renderer), Some(node)) = (self.renderer.as_mut(), self.arena.get(key)) {
            renderer.render_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    fn texts(nodes: Vec<&Node>) -> Vec<&str> {
        nodes.into_iter().map(Node::text).collect()
    }

    fn sample() -> Tree {
        Tree::from_nodes(vec![
            NodeData::new("a")
                .child(NodeData::new("a1"))
                .child(NodeData::new("a2").child(NodeData::new("a2x"))),
            NodeData::new("b"),
        ])
    }

    #[test]
    fn test_queries() {
        let tree = sample();

        assert!(tree.is_initialized());
        assert_eq!(tree.len(), 5);
        assert_eq!(texts(tree.nodes()), vec!["a", "a1", "a2", "a2x", "b"]);
        assert_eq!(texts(tree.root_nodes()), vec!["a", "b"]);
        assert_eq!(texts(tree.children(&id("0.0"))), vec!["a1", "a2"]);
        assert_eq!(tree.parent(&id("0.0.1.0")).map(Node::text), Some("a2"));
        assert_eq!(tree.parent(&id("0.1")).map(Node::text), None);
        assert_eq!(texts(tree.parents(&[id("0.0.0"), id("0.0.1")])), vec!["a"]);
        assert_eq!(texts(tree.siblings(&[id("0.0.0"), id("0.1")])), vec!["a2", "a"]);
        assert_eq!(texts(tree.ancestors(&id("0.0.1.0"))), vec!["a2", "a"]);
        assert!(tree.node(&id("0.9")).is_none());
    }

    #[test]
    fn test_walk_orders() {
        let tree = sample();
        let post: Vec<&str> = tree.walk(TraversalOrder::PostOrder).map(Node::text).collect();
        assert_eq!(post, vec!["a1", "a2x", "a2", "a", "b"]);
        let bfs: Vec<&str> = tree.walk(TraversalOrder::BreadthFirst).map(Node::text).collect();
        assert_eq!(bfs, vec!["a", "b", "a1", "a2", "a2x"]);
    }

    #[test]
    fn test_add_nodes_at_index_renumbers() {
        let mut tree = sample();
        let ids = tree.add_nodes(
            vec![NodeData::new("new1"), NodeData::new("new2")],
            Some(&id("0.0")),
            Some(1),
            StateOptions::default(),
        );

        assert_eq!(ids, vec![id("0.0.1"), id("0.0.2")]);
        assert_eq!(texts(tree.children(&id("0.0"))), vec!["a1", "new1", "new2", "a2"]);
        assert_eq!(tree.node(&id("0.0.3.0")).map(Node::text), Some("a2x"));
        // Parent gets expanded so the new nodes show
        assert!(tree.node(&id("0.0")).unwrap().is_expanded());
        assert!(tree.node(&id("0.0.1")).unwrap().is_visible());
    }

    #[test]
    fn test_add_nodes_past_end_appends() {
        let mut tree = sample();
        let ids = tree.add_nodes(vec![NodeData::new("c")], None, Some(42), StateOptions::default());
        assert_eq!(ids, vec![id("0.2")]);
        let orphans = tree.add_nodes(
            vec![NodeData::new("x")],
            Some(&id("0.7")),
            None,
            StateOptions::default(),
        );
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_remove_nodes_skips_nested() {
        let mut tree = sample();
        let removed = tree.remove_nodes(&[id("0.0.1.0"), id("0.0"), id("0.5")]);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].text, "a");
        assert_eq!(texts(tree.nodes()), vec!["b"]);
        assert_eq!(tree.node(&id("0.0")).map(Node::text), Some("b"));
    }

    #[test]
    fn test_remove_siblings_in_one_call() {
        let mut tree = sample();
        tree.remove_nodes(&[id("0.0.0"), id("0.0.1")]);
        assert!(tree.children(&id("0.0")).is_empty());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_update_node_replaces_in_place() {
        let mut tree = sample();
        let new_id = tree.update_node(&id("0.0.1"), NodeData::new("fresh"));

        assert_eq!(new_id, Some(id("0.0.1")));
        assert_eq!(texts(tree.children(&id("0.0"))), vec!["a1", "fresh"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.update_node(&id("0.4"), NodeData::new("nope")), None);
    }

    #[test]
    fn test_changed_nodes_against_save_point() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a").checked(true), NodeData::new("b")]);
        assert!(tree.changed_nodes().is_empty());

        tree.check_nodes(&[id("0.1")], StateOptions::default());
        tree.uncheck_nodes(&[id("0.0")], StateOptions::default());
        assert_eq!(texts(tree.changed_nodes()), vec!["a", "b"]);

        tree.mark_checked_changes_saved();
        assert!(tree.changed_nodes().is_empty());
    }

    #[test]
    fn test_export_keeps_state_and_payload() {
        let mut tree = Tree::from_nodes(vec![NodeData::new("a").with_field("icon", "folder")]);
        tree.select_nodes(&[id("0.0")], StateOptions::default());

        let exported = tree.export();
        assert_eq!(exported[0].extra["icon"], "folder");
        assert_eq!(exported[0].state.unwrap().selected, Some(true));
    }
}
