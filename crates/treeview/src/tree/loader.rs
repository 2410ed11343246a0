//! Initial loading of a tree from a data source

use log::{info, warn};

use crate::error::LoadError;
use crate::tree::data::{DataFetcher, DataSource, NodeData, SourceConfig};
use crate::tree::event::Event;
use crate::tree::structure::Tree;

impl Tree {
    /// Build the tree from `source`, replacing any existing nodes
    ///
    /// Notifies `LoadingStarted`, then either `Initialized` or `LoadingFailed`.
    /// On failure the tree is left as it was.
    pub fn load(&mut self, source: DataSource) -> Result<(), LoadError> {
        self.load_with(|fetcher| source.resolve(fetcher))
    }

    /// Validate a `data` / `dataUrl` configuration and load from it
    pub fn load_config(&mut self, config: SourceConfig) -> Result<(), LoadError> {
        self.load_with(|fetcher| config.into_source()?.resolve(fetcher))
    }

    fn load_with<F>(&mut self, resolve: F) -> Result<(), LoadError>
    where
        F: FnOnce(Option<&dyn DataFetcher>) -> Result<Vec<NodeData>, LoadError>,
    {
        self.events.emit(Event::LoadingStarted);

        let nodes = match resolve(self.fetcher.as_deref()) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!("loading failed: {}", err);
                self.events.emit(Event::LoadingFailed {
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        self.replace_roots(nodes);
        info!("loaded {} nodes", self.len());

        let ids = self.ids_of(self.index.ordered());
        self.events.emit(Event::Initialized { nodes: ids });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::data::RemoteSource;

    #[test]
    fn test_load_json_notifies() {
        let mut tree = Tree::default();
        let events = tree.subscribe();
        tree.load(DataSource::Json(r#"[{"text": "a"}]"#.into())).unwrap();

        let events: Vec<Event> = events.try_iter().collect();
        assert_eq!(events.first(), Some(&Event::LoadingStarted));
        assert_eq!(
            events.last(),
            Some(&Event::Initialized {
                nodes: vec!["0.0".parse().unwrap()]
            })
        );
        assert!(tree.is_initialized());
    }

    #[test]
    fn test_failed_load_builds_nothing() {
        let mut tree = Tree::default();
        let events = tree.subscribe();
        let err = tree.load(DataSource::Json("not json".into())).unwrap_err();

        assert!(matches!(err, LoadError::Parse(_)));
        assert!(tree.is_empty());
        assert!(!tree.is_initialized());
        let events: Vec<Event> = events.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Event::LoadingFailed { .. }));
    }

    #[test]
    fn test_load_config_uses_installed_fetcher() {
        let mut tree = Tree::default();
        tree.set_fetcher(|source: &RemoteSource| -> anyhow::Result<String> {
            Ok(format!(r#"[{{"text": "{}"}}]"#, source.url))
        });
        let config = SourceConfig {
            data: None,
            data_url: Some(RemoteSource::new("tree.json")),
        };
        tree.load_config(config).unwrap();
        assert_eq!(tree.root_nodes()[0].text(), "tree.json");
    }
}
