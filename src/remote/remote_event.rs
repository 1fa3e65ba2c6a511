use std::collections::{BTreeMap, BTreeSet};

use crate::model::{DocumentKey, SnapshotVersion};
use crate::remote::target::{ResumeToken, TargetId};
use crate::remote::watch_change::WatchDocument;

/// Per-target summary of what changed in one aggregator pass (§4.3 step 3).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetChange {
    pub resume_token: ResumeToken,
    pub current: bool,
    pub added_documents: BTreeSet<DocumentKey>,
    pub modified_documents: BTreeSet<DocumentKey>,
    pub removed_documents: BTreeSet<DocumentKey>,
    /// Set when the server sent a `Reset` target-change state: the mapping
    /// for this target should replace, not merge with, the tracked remote
    /// key set (§4.4 "ResetMapping").
    pub is_reset_mapping: bool,
}

/// A consistent cut of target/document updates at a single snapshot version,
/// ready to be applied by the sync engine (GLOSSARY).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteEvent {
    pub snapshot_version: SnapshotVersion,
    pub target_changes: BTreeMap<TargetId, TargetChange>,
    /// `None` marks a deleted/removed document (§4.3 step 1 "document or
    /// deleted-document").
    pub document_updates: BTreeMap<DocumentKey, Option<WatchDocument>>,
    /// Targets whose existence-filter reconciliation (§4.4) found the local
    /// view had drifted from the server's reported cardinality.
    existence_filter_mismatches: BTreeSet<TargetId>,
}

impl RemoteEvent {
    pub fn new(snapshot_version: SnapshotVersion) -> Self {
        Self {
            snapshot_version,
            target_changes: BTreeMap::new(),
            document_updates: BTreeMap::new(),
            existence_filter_mismatches: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.target_changes.is_empty()
            && self.document_updates.is_empty()
            && self.existence_filter_mismatches.is_empty()
    }

    /// Signals the sync engine to discard remote state for this target
    /// (§4.4 step 1).
    pub fn on_existence_filter_mismatch(&mut self, target_id: TargetId) {
        self.existence_filter_mismatches.insert(target_id);
    }

    pub fn existence_filter_mismatches(&self) -> &BTreeSet<TargetId> {
        &self.existence_filter_mismatches
    }

    pub fn target_change_mut(&mut self, target_id: TargetId) -> &mut TargetChange {
        self.target_changes.entry(target_id).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;

    #[test]
    fn starts_empty() {
        let event = RemoteEvent::new(Timestamp::new(1, 0));
        assert!(event.is_empty());
        assert!(event.existence_filter_mismatches().is_empty());
    }

    #[test]
    fn records_existence_filter_mismatch() {
        let mut event = RemoteEvent::new(Timestamp::new(1, 0));
        event.on_existence_filter_mismatch(7);
        assert!(event.existence_filter_mismatches().contains(&7));
        assert!(!event.is_empty(), "a mismatch alone must still be forwarded to the sync engine");
    }
}
