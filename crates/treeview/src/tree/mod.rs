//! Tree state engine
//!
//! The [`Tree`] owns every [`Node`], assigns hierarchical [`NodeId`]s, keeps a
//! flat render-ordered index and enforces the state rules for selection,
//! checking, expansion, disabling and search.

mod arena;
mod data;
mod event;
mod index;
mod loader;
mod node;
mod options;
mod search;
mod state;
mod structure;
mod traits;

pub use data::{
    DataFetcher, DataSource, LazyLoader, NodeData, NodeStateData, RemoteSource, SourceConfig,
};
pub use event::Event;
pub use node::{CheckState, Node, NodeId, NodeState};
pub use options::{SearchOptions, StateOptions, TreeOptions, EXPAND_ALL_LEVELS};
pub use search::SearchField;
pub use structure::Tree;
pub use traits::TraversalOrder;

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        CheckState, DataSource, Event, Node, NodeData, NodeId, SearchField, SearchOptions,
        StateOptions, TraversalOrder, Tree, TreeOptions, EXPAND_ALL_LEVELS,
    };
}
