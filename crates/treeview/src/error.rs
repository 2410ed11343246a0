//! Error types for loading and querying trees

use std::path::PathBuf;

/// Failure to produce the initial node descriptions
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no data source configured")]
    NoDataSource,
    #[error("both local data and a data url are configured")]
    ConflictingSources,
    #[error("local data must be an array of nodes or a JSON string")]
    UnsupportedData,
    #[error("remote data source configured but no fetcher installed")]
    NoFetcher,
    #[error("failed to parse node data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure of a tree query
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("invalid node id {0:?}")]
    InvalidNodeId(String),
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
