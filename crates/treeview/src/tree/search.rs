//! Pattern search over node attributes

use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;

use derive_more::Display;
use log::debug;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TreeError;
use crate::tree::event::Event;
use crate::tree::node::{CheckState, Node, NodeId, NodeKey};
use crate::tree::options::{SearchOptions, StateOptions};
use crate::tree::structure::Tree;

/// Node attribute tested by a search
///
/// Parsed from the dotted attribute vocabulary (`text`, `state.selected`,
/// ...). Any other name is a dotted path into the node's pass-through payload,
/// where numeric segments index into arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchField {
    #[default]
    #[display(fmt = "text")]
    Text,
    #[display(fmt = "nodeId")]
    NodeId,
    #[display(fmt = "level")]
    Level,
    #[display(fmt = "index")]
    Index,
    #[display(fmt = "state.checked")]
    Checked,
    #[display(fmt = "state.selected")]
    Selected,
    #[display(fmt = "state.expanded")]
    Expanded,
    #[display(fmt = "state.disabled")]
    Disabled,
    #[display(fmt = "state.visible")]
    Visible,
    #[display(fmt = "searchResult")]
    SearchResult,
    #[display(fmt = "{}", _0)]
    Payload(String),
}

impl FromStr for SearchField {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => SearchField::Text,
            "nodeId" => SearchField::NodeId,
            "level" => SearchField::Level,
            "index" => SearchField::Index,
            "state.checked" => SearchField::Checked,
            "state.selected" => SearchField::Selected,
            "state.expanded" => SearchField::Expanded,
            "state.disabled" => SearchField::Disabled,
            "state.visible" => SearchField::Visible,
            "searchResult" => SearchField::SearchResult,
            other => SearchField::Payload(other.to_string()),
        })
    }
}

impl From<String> for SearchField {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(field) => field,
            Err(never) => match never {},
        }
    }
}

impl From<SearchField> for String {
    fn from(field: SearchField) -> Self {
        field.to_string()
    }
}

impl SearchField {
    /// String form of the attribute on `node`, `None` when it is absent
    pub fn value(&self, node: &Node) -> Option<String> {
        let state = node.state();
        match self {
            SearchField::Text => Some(node.text().to_string()),
            SearchField::NodeId => Some(node.id().to_string()),
            SearchField::Level => Some(node.level().to_string()),
            SearchField::Index => Some(node.index().to_string()),
            SearchField::Checked => match state.checked {
                CheckState::Checked => Some("true".to_string()),
                CheckState::Unchecked => Some("false".to_string()),
                CheckState::Partial => Some("null".to_string()),
            },
            SearchField::Selected => Some(state.selected.to_string()),
            SearchField::Expanded => state.expanded.map(|expanded| expanded.to_string()),
            SearchField::Disabled => Some(state.disabled.to_string()),
            SearchField::Visible => Some(state.visible.to_string()),
            SearchField::SearchResult => Some(state.search_result.to_string()),
            SearchField::Payload(path) => lookup(node, path).and_then(coerce),
        }
    }
}

fn lookup<'a>(node: &'a Node, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = node.payload().get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(coerce)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => None,
    }
}

fn build_regex(pattern: &str, ignore_case: bool, exact_match: bool) -> Result<Regex, TreeError> {
    let source = if exact_match {
        format!("^(?:{})$", pattern)
    } else {
        pattern.to_string()
    };
    Ok(RegexBuilder::new(&source)
        .case_insensitive(ignore_case)
        .build()?)
}

impl Tree {
    /// Mark the nodes whose `field` matches `pattern` as search results
    ///
    /// Only nodes whose flag actually changes are handed back to the renderer.
    /// An empty pattern matches nothing and clears the previous results.
    /// Returns the matches in render order.
    pub fn search(
        &mut self,
        pattern: &str,
        options: &SearchOptions,
    ) -> Result<Vec<NodeId>, TreeError> {
        let matches = if pattern.is_empty() {
            Vec::new()
        } else {
            let regex = build_regex(pattern, options.ignore_case, options.exact_match)?;
            self.matching_keys(&regex, &options.field)
        };

        let previous: HashSet<NodeKey> = self.search_results.iter().copied().collect();
        let current: HashSet<NodeKey> = matches.iter().copied().collect();
        let stale: Vec<NodeKey> = previous.difference(&current).copied().collect();
        let fresh: Vec<NodeKey> = matches
            .iter()
            .copied()
            .filter(|key| !previous.contains(key))
            .collect();
        for (keys, flag) in [(stale, false), (fresh, true)] {
            for key in keys {
                if let Some(node) = self.arena.get_mut(key) {
                    node.state.search_result = flag;
                    self.reconcile(key);
                }
            }
        }
        self.search_results = matches;

        if options.reveal_results {
            let reveal = StateOptions::new().silent(options.silent);
            for key in self.search_results.clone() {
                self.reveal_key(key, reveal);
            }
        }

        let results = self.ids_of(&self.search_results);
        debug!("search {:?} matched {} nodes", pattern, results.len());
        self.notify(
            options.silent,
            Event::SearchComplete {
                results: results.clone(),
            },
        );
        Ok(results)
    }

    /// Clear every search flag and forget the results
    pub fn clear_search(&mut self, options: StateOptions) -> Vec<NodeId> {
        let previous = std::mem::take(&mut self.search_results);
        let cleared = self.ids_of(&previous);
        for key in previous {
            if let Some(node) = self.arena.get_mut(key) {
                node.state.search_result = false;
                self.reconcile(key);
            }
        }
        self.notify(
            options.silent,
            Event::SearchCleared {
                cleared: cleared.clone(),
            },
        );
        cleared
    }

    /// Case-sensitive lookup of the nodes whose `field` matches `pattern`
    ///
    /// Leaves search state untouched.
    pub fn find_nodes(&self, pattern: &str, field: &SearchField) -> Result<Vec<&Node>, TreeError> {
        let regex = build_regex(pattern, false, false)?;
        Ok(self
            .matching_keys(&regex, field)
            .into_iter()
            .filter_map(|key| self.arena.get(key))
            .collect())
    }

    fn matching_keys(&self, regex: &Regex, field: &SearchField) -> Vec<NodeKey> {
        self.index
            .ordered()
            .iter()
            .copied()
            .filter(|&key| {
                self.arena
                    .get(key)
                    .and_then(|node| field.value(node))
                    .is_some_and(|value| regex.is_match(&value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::data::NodeData;
    use serde_json::json;

    fn node(data: NodeData) -> Node {
        Node::from_data(data)
    }

    #[test]
    fn test_field_names_round_trip() {
        let names = [
            "text",
            "nodeId",
            "state.checked",
            "state.selected",
            "searchResult",
            "tags.0",
        ];
        for name in names {
            let field: SearchField = name.parse().unwrap();
            assert_eq!(field.to_string(), name);
        }
        assert_eq!(
            "color".parse::<SearchField>().unwrap(),
            SearchField::Payload("color".into())
        );
    }

    #[test]
    fn test_field_serde() {
        let field: SearchField = serde_json::from_value(json!("state.disabled")).unwrap();
        assert_eq!(field, SearchField::Disabled);
        assert_eq!(serde_json::to_value(SearchField::Level).unwrap(), json!("level"));
    }

    #[test]
    fn test_state_values() {
        let partial = node(NodeData::new("a").partially_checked());
        assert_eq!(SearchField::Checked.value(&partial).as_deref(), Some("null"));
        // Unindexed nodes have no expansion decision yet
        assert_eq!(SearchField::Expanded.value(&partial), None);
        assert_eq!(SearchField::Selected.value(&partial).as_deref(), Some("false"));

        let checked = node(NodeData::new("b").checked(true).expanded(true));
        assert_eq!(SearchField::Checked.value(&checked).as_deref(), Some("true"));
        assert_eq!(SearchField::Expanded.value(&checked).as_deref(), Some("true"));
    }

    #[test]
    fn test_payload_values() {
        let n = node(
            NodeData::new("a")
                .with_field("tags", json!(["red", 4]))
                .with_field("meta", json!({"owner": {"name": "ops"}, "note": null}))
                .with_field("size", json!(12)),
        );
        let value = |path: &str| SearchField::Payload(path.into()).value(&n);

        assert_eq!(value("tags").as_deref(), Some("red,4"));
        assert_eq!(value("tags.1").as_deref(), Some("4"));
        assert_eq!(value("meta.owner.name").as_deref(), Some("ops"));
        assert_eq!(value("meta.note").as_deref(), Some("null"));
        assert_eq!(value("size").as_deref(), Some("12"));
        assert_eq!(value("meta"), None);
        assert_eq!(value("missing"), None);
        assert_eq!(value("tags.9"), None);
    }

    #[test]
    fn test_regex_flags() {
        let re = build_regex("alp", true, false).unwrap();
        assert!(re.is_match("ALPHA"));
        let re = build_regex("alp|beta", false, true).unwrap();
        assert!(!re.is_match("alpha"));
        assert!(re.is_match("beta"));
        assert!(matches!(
            build_regex("(", true, false),
            Err(TreeError::InvalidPattern(_))
        ));
    }
}
