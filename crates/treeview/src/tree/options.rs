//! Configuration options for the tree engine.
//!
//! [`TreeOptions`] holds the tree-wide behaviour switches, [`StateOptions`]
//! the per-call flags accepted by every state mutator and [`SearchOptions`]
//! the search configuration.

use serde::{Deserialize, Serialize};

use crate::tree::search::SearchField;

/// Default number of levels opened by [`Tree::expand_all`](crate::tree::Tree::expand_all).
pub const EXPAND_ALL_LEVELS: usize = 999;

/// Tree-wide behaviour switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeOptions {
    /// Auto-expand depth: nodes up to this level start visible, nodes above it
    /// start expanded.
    pub levels: usize,

    /// Allow more than one selected node.
    pub multi_select: bool,

    /// Refuse to unselect the last selected node.
    pub prevent_unselect: bool,

    /// When an unselect is refused, report the node as selected again.
    pub allow_reselect: bool,

    /// Derive parent check states from their children (tri-state checkboxes).
    pub hierarchical_check: bool,

    /// Notify for every ancestor and descendant touched by a hierarchical
    /// toggle, not only for the toggled node.
    pub propagate_check_event: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            levels: 1,
            multi_select: false,
            prevent_unselect: false,
            allow_reselect: false,
            hierarchical_check: false,
            propagate_check_event: false,
        }
    }
}

impl TreeOptions {
    /// Create tree options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the auto-expand depth.
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Enable or disable multi-select.
    pub fn multi_select(mut self, enabled: bool) -> Self {
        self.multi_select = enabled;
        self
    }

    /// Enable or disable refusing to unselect the last selected node.
    pub fn prevent_unselect(mut self, enabled: bool) -> Self {
        self.prevent_unselect = enabled;
        self
    }

    /// Enable or disable reselect notifications.
    pub fn allow_reselect(mut self, enabled: bool) -> Self {
        self.allow_reselect = enabled;
        self
    }

    /// Enable or disable hierarchical (tri-state) checking.
    pub fn hierarchical_check(mut self, enabled: bool) -> Self {
        self.hierarchical_check = enabled;
        self
    }

    /// Enable or disable notifications for propagated check changes.
    pub fn propagate_check_event(mut self, enabled: bool) -> Self {
        self.propagate_check_event = enabled;
        self
    }
}

/// Per-call flags of the state mutators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateOptions {
    /// Suppress the resulting notifications.
    pub silent: bool,

    /// Apply even when the new value equals the current one.
    pub force: bool,

    /// When disabling, keep the selected/checked/expanded flags.
    pub keep_state: bool,

    /// Set while clearing other selections, so `prevent_unselect` does not
    /// block the clear.
    pub(crate) unselecting: bool,
}

impl StateOptions {
    /// Options with every flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress notifications.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Apply even when unchanged.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Keep other state when disabling.
    pub fn keep_state(mut self, keep: bool) -> Self {
        self.keep_state = keep;
        self
    }

    pub(crate) fn unselecting(mut self) -> Self {
        self.unselecting = true;
        self
    }
}

/// Search configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Match regardless of case.
    pub ignore_case: bool,

    /// Require the whole attribute value to match.
    pub exact_match: bool,

    /// Expand the ancestors of every match.
    pub reveal_results: bool,

    /// Attribute tested against the pattern.
    pub field: SearchField,

    /// Suppress the search notification and the reveal notifications.
    #[serde(skip)]
    pub silent: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            exact_match: false,
            reveal_results: true,
            field: SearchField::Text,
            silent: false,
        }
    }
}

impl SearchOptions {
    /// Create search options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match regardless of case.
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    /// Require whole-value matches.
    pub fn exact_match(mut self, exact: bool) -> Self {
        self.exact_match = exact;
        self
    }

    /// Expand ancestors of matches.
    pub fn reveal_results(mut self, reveal: bool) -> Self {
        self.reveal_results = reveal;
        self
    }

    /// Set the searched attribute.
    pub fn field(mut self, field: SearchField) -> Self {
        self.field = field;
        self
    }

    /// Suppress notifications.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}
