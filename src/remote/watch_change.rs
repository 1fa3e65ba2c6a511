use crate::model::{DocumentKey, SnapshotVersion};
use crate::remote::target::{ResumeToken, TargetId};
use crate::value::MapValue;
use crate::RemoteStoreError;

/// A document snapshot as delivered by the watch stream.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchDocument {
    pub key: DocumentKey,
    pub fields: MapValue,
    pub update_time: SnapshotVersion,
}

/// The server-reported lifecycle state of a target within a `TargetChange`
/// (§4.2, §9 "tagged watch-change variants").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetChangeState {
    NoChange,
    Added,
    Removed,
    Current,
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WatchTargetChange {
    pub state: TargetChangeState,
    pub target_ids: Vec<TargetId>,
    pub resume_token: ResumeToken,
    /// Present only when `state == Removed`; a non-empty cause means a
    /// target error (§4.2 step 2).
    pub cause: Option<RemoteStoreError>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WatchDocumentChange {
    pub updated_target_ids: Vec<TargetId>,
    pub removed_target_ids: Vec<TargetId>,
    pub document: WatchDocument,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WatchDocumentDelete {
    pub key: DocumentKey,
    pub removed_target_ids: Vec<TargetId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WatchDocumentRemove {
    pub key: DocumentKey,
    pub removed_target_ids: Vec<TargetId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExistenceFilter {
    pub target_id: TargetId,
    pub count: u32,
}

/// A single raw message delivered by the watch stream, encoded as a tagged
/// sum rather than a runtime type check (§9 "Tagged watch-change variants").
#[derive(Clone, Debug, PartialEq)]
pub enum WatchChange {
    TargetChange(WatchTargetChange),
    DocumentChange(WatchDocumentChange),
    DocumentDelete(WatchDocumentDelete),
    DocumentRemove(WatchDocumentRemove),
    ExistenceFilter(ExistenceFilter),
}
