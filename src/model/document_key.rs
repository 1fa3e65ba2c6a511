use std::fmt;

use super::ResourcePath;

/// Identifies a single document by its fully-qualified path. Document paths
/// always have an even segment count (collection, document, collection,
/// document, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    path: ResourcePath,
}

impl DocumentKey {
    pub fn from_path(path: ResourcePath) -> Self {
        assert!(path.len() % 2 == 0, "document paths must have an even number of segments");
        Self { path }
    }

    pub fn from_string(path: &str) -> Self {
        Self::from_path(ResourcePath::from_string(path))
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn collection_path(&self) -> ResourcePath {
        self.path.without_last()
    }

    pub fn id(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}
