//! Rendering collaborators
//!
//! The engine never draws anything itself. After every full rebuild it hands
//! the render-ordered node sequence to a [`Renderer`], and after a state
//! change it asks the renderer to reconcile the single node that changed.

use crate::tree::{CheckState, Node};

/// Consumer of the engine's state
pub trait Renderer {
    /// Redraw the whole tree from the render-ordered sequence
    fn render(&mut self, nodes: &[&Node]);

    /// Reconcile a single node whose state changed
    fn render_node(&mut self, _node: &Node) {}
}

/// Expander glyph for a node
pub fn expander_glyph(node: &Node) -> &'static str {
    if node.is_expanded() {
        "▾"
    } else if node.has_children() || node.is_lazy() {
        "▸"
    } else {
        " "
    }
}

/// Checkbox glyph for a check state
pub fn checkbox_glyph(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Unchecked => "[ ]",
        CheckState::Partial => "[-]",
    }
}

/// Plain-text renderer producing one indented line per node
///
/// ```text
/// ▾ [-] Parent (selected)
///     [x] Child
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    show_checkboxes: bool,
    show_hidden: bool,
    output: String,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix each line with the node's checkbox
    pub fn show_checkboxes(mut self, show: bool) -> Self {
        self.show_checkboxes = show;
        self
    }

    /// Include nodes that are currently not visible
    pub fn show_hidden(mut self, show: bool) -> Self {
        self.show_hidden = show;
        self
    }

    /// Text produced by the last full render
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Format a single node as one line
    pub fn line(&self, node: &Node) -> String {
        let mut line = "  ".repeat(node.level().saturating_sub(1));
        line.push_str(expander_glyph(node));
        line.push(' ');
        if self.show_checkboxes {
            line.push_str(checkbox_glyph(node.state().checked));
            line.push(' ');
        }
        line.push_str(node.text());
        if node.is_selected() {
            line.push_str(" (selected)");
        }
        if node.is_disabled() {
            line.push_str(" (disabled)");
        }
        if node.is_search_result() {
            line.push_str(" (match)");
        }
        line
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, nodes: &[&Node]) {
        self.output = nodes
            .iter()
            .filter(|node| self.show_hidden || node.is_visible())
            .map(|node| self.line(node))
            .collect::<Vec<_>>()
            .join("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;
    use crate::tree::Tree;

    #[test]
    fn test_line_format() {
        let tree = Tree::from_nodes(vec![NodeData::new("root")
            .selected(true)
            .checked(true)
            .child(NodeData::new("leaf").disabled(true))]);
        let renderer = TextRenderer::new().show_checkboxes(true);
        let lines: Vec<String> = tree.nodes().into_iter().map(|n| renderer.line(n)).collect();

        assert_eq!(lines[0], "▸ [x] root (selected)");
        assert_eq!(lines[1], "    [ ] leaf (disabled)");
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let tree = Tree::from_nodes(vec![NodeData::new("root").child(NodeData::new("leaf"))]);
        let mut renderer = TextRenderer::new();
        renderer.render(&tree.nodes());
        assert_eq!(renderer.output(), "▸ root");

        let mut renderer = TextRenderer::new().show_hidden(true);
        renderer.render(&tree.nodes());
        assert_eq!(renderer.output(), "▸ root\n    leaf");
    }
}
