//! Core node types for the tree state engine

use derive_more::Display;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::TreeError;
use crate::tree::data::{NodeData, NodeStateData};

/// Arena slot of a node inside its owning tree
///
/// Keys survive re-indexing. A removed node's slot is never handed out again,
/// so a stale key simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeKey(pub(crate) usize);

impl NodeKey {
    /// Get the inner slot index
    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// Hierarchical identity of a node
///
/// A dot-separated path of zero-based sibling indices starting at the virtual
/// root, e.g. `0.2.1` is the second child of the third root. The identity
/// doubles as the render-order sort key: ancestors sort before descendants and
/// siblings sort by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(SmallVec<[usize; 8]>);

impl NodeId {
    /// Identity of the virtual root above the root-level nodes
    pub(crate) fn virtual_root() -> Self {
        let mut path = SmallVec::new();
        path.push(0);
        NodeId(path)
    }

    /// Placeholder carried by nodes that have not been indexed yet
    pub(crate) fn unassigned() -> Self {
        NodeId(SmallVec::new())
    }

    /// Identity of this node's child at `index`
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        NodeId(path)
    }

    /// Path components, starting with the virtual root component
    pub fn components(&self) -> &[usize] {
        &self.0
    }

    /// Level encoded in the path (1 = root level, 0 = unassigned)
    pub fn level(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Position of the node among its siblings
    pub fn index(&self) -> Option<usize> {
        if self.0.len() < 2 {
            return None;
        }
        self.0.last().copied()
    }

    /// Identity of the parent node, `None` for root-level nodes
    pub fn parent(&self) -> Option<NodeId> {
        if self.0.len() <= 2 {
            return None;
        }
        Some(NodeId(self.0[..self.0.len() - 1].iter().copied().collect()))
    }

    /// Check whether this id is a strict path prefix of `other`
    pub fn is_ancestor_of(&self, other: &NodeId) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Hierarchical path comparison
    ///
    /// Components compare as integers, left to right. When one path is a
    /// strict prefix of the other, the shorter (ancestor) sorts first.
    pub fn compare(&self, other: &NodeId) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TreeError::InvalidNodeId(s.to_string());
        let path = s
            .split('.')
            .map(|part| part.parse::<usize>().map_err(|_| invalid()))
            .collect::<Result<SmallVec<[usize; 8]>, _>>()?;

        if path.len() < 2 || path[0] != 0 {
            return Err(invalid());
        }
        Ok(NodeId(path))
    }
}

/// Checkbox state of a node
///
/// `Partial` only exists in hierarchical check mode, where it marks a parent
/// whose children disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum CheckState {
    /// The node is checked
    #[display(fmt = "checked")]
    Checked,
    /// The node is unchecked
    #[default]
    #[display(fmt = "unchecked")]
    Unchecked,
    /// Some, but not all, children are checked
    #[display(fmt = "partial")]
    Partial,
}

impl CheckState {
    /// Convert a plain boolean into a check state
    pub const fn from_bool(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    /// Returns true only for `Checked`
    pub const fn is_checked(self) -> bool {
        matches!(self, CheckState::Checked)
    }

    /// State reached by toggling: partial and unchecked both become checked
    pub const fn toggled(self) -> Self {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            CheckState::Unchecked | CheckState::Partial => CheckState::Checked,
        }
    }

    fn from_data(checked: Option<Option<bool>>) -> Self {
        match checked {
            Some(Some(checked)) => CheckState::from_bool(checked),
            Some(None) => CheckState::Partial,
            None => CheckState::Unchecked,
        }
    }

    fn to_data(self) -> Option<bool> {
        match self {
            CheckState::Checked => Some(true),
            CheckState::Unchecked => Some(false),
            CheckState::Partial => None,
        }
    }
}

/// State flags of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeState {
    /// Checkbox state
    pub checked: CheckState,
    /// Whether the node is selected
    pub selected: bool,
    /// Whether the node is expanded (`None` until the first indexing pass)
    pub expanded: Option<bool>,
    /// Whether the node is disabled
    pub disabled: bool,
    /// Whether the node is shown (derived from levels and parent expansion)
    pub visible: bool,
    /// Whether the node matched the current search
    pub search_result: bool,
}

/// A single node in the tree
///
/// Structural fields (`id`, `level`, `index`, `parent`) are written by the
/// indexer; state flags only change through the tree's mutators.
#[derive(Debug, Clone)]
pub struct Node {
    text: String,
    payload: Map<String, Value>,
    selectable: bool,
    checkable: bool,
    pub(crate) lazy_load: bool,
    pub(crate) state: NodeState,
    pub(crate) id: NodeId,
    pub(crate) level: usize,
    pub(crate) index: usize,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    /// Create an unindexed node from its description, ignoring `nodes`
    pub(crate) fn from_data(data: NodeData) -> Self {
        let state = data.state.unwrap_or_default();
        Self {
            text: data.text,
            payload: data.extra,
            selectable: data.selectable.unwrap_or(true),
            checkable: data.checkable.unwrap_or(true),
            lazy_load: data.lazy_load,
            state: NodeState {
                checked: CheckState::from_data(state.checked),
                selected: state.selected.unwrap_or(false),
                expanded: state.expanded,
                disabled: state.disabled.unwrap_or(false),
                visible: false,
                search_result: false,
            },
            id: NodeId::unassigned(),
            level: 0,
            index: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Description of this node without its children
    pub(crate) fn to_data(&self) -> NodeData {
        NodeData {
            text: self.text.clone(),
            nodes: None,
            state: Some(NodeStateData {
                checked: Some(self.state.checked.to_data()),
                expanded: self.state.expanded,
                selected: Some(self.state.selected),
                disabled: Some(self.state.disabled),
            }),
            selectable: (!self.selectable).then_some(false),
            checkable: (!self.checkable).then_some(false),
            lazy_load: self.lazy_load,
            extra: self.payload.clone(),
        }
    }

    /// The node's display text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pass-through presentation fields (icon, color, tags, ...)
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Hierarchical identity assigned by the last indexing pass
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Depth of the node (1 = root level)
    pub fn level(&self) -> usize {
        self.level
    }

    /// Position among siblings
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current state flags
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Returns true if the node has at least one child
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the node may become selected
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Returns true if the node may become checked
    pub fn is_checkable(&self) -> bool {
        self.checkable
    }

    /// Returns true while the node's children are still to be lazy loaded
    pub fn is_lazy(&self) -> bool {
        self.lazy_load
    }

    /// Returns true if the node is checked
    pub fn is_checked(&self) -> bool {
        self.state.checked.is_checked()
    }

    /// Returns true if the node is selected
    pub fn is_selected(&self) -> bool {
        self.state.selected
    }

    /// Returns true if the node is expanded
    pub fn is_expanded(&self) -> bool {
        self.state.expanded == Some(true)
    }

    /// Returns true if the node is disabled
    pub fn is_disabled(&self) -> bool {
        self.state.disabled
    }

    /// Returns true if the node is shown
    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    /// Returns true if the node matched the current search
    pub fn is_search_result(&self) -> bool {
        self.state.search_result
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.id)
    }
}
