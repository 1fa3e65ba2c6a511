mod document_key;
mod resource_path;
mod timestamp;

pub use document_key::DocumentKey;
pub use resource_path::ResourcePath;
pub use timestamp::Timestamp;

/// A monotonically non-decreasing logical timestamp across watch messages (GLOSSARY).
pub type SnapshotVersion = Timestamp;
