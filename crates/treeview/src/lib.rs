//! Tree View State Engine
//!
//! A library for managing an interactive hierarchical list of items with
//! selection, tri-state checkboxes, expansion, disabling and search, driven by
//! a nested JSON description.
//!
//! # Core Concepts
//!
//! - **Tree**: owns the nodes and enforces every state transition rule
//! - **Node**: a single element with its text, payload and state flags
//! - **NodeId**: dotted hierarchical identity, also the render-order key
//! - **Renderer**: collaborator that draws the tree after each change
//!
//! # Example
//!
//! ```
//! use treeview::prelude::*;
//!
//! let json = r#"[{"text": "P", "nodes": [{"text": "C1"}, {"text": "C2"}]}]"#;
//! let mut tree = Tree::new(TreeOptions::new().hierarchical_check(true));
//! tree.load(DataSource::Json(json.to_string())).unwrap();
//!
//! let child: NodeId = "0.0.0".parse().unwrap();
//! tree.toggle_checked(&[child], StateOptions::default());
//!
//! let parent: NodeId = "0.0".parse().unwrap();
//! assert_eq!(tree.node(&parent).unwrap().state().checked, CheckState::Partial);
//!
//! let matches = tree.search("c2", &SearchOptions::default()).unwrap();
//! assert_eq!(matches, vec!["0.0.1".parse::<NodeId>().unwrap()]);
//! // Revealing the match expanded its parent
//! assert!(tree.node(&parent).unwrap().is_expanded());
//! ```

pub mod error;
pub mod render;
pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{LoadError, TreeError};
    pub use crate::render::{Renderer, TextRenderer};
    pub use crate::tree::prelude::*;
}
