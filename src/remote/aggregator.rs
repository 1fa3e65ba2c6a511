//! The watch-change aggregator (C1, §4.3).
//!
//! Implemented as a pure function over a working struct scoped to a single
//! call, per the design note on aggregator purity: it takes no reference to
//! the Remote Store and can be exercised in isolation (this is what makes S3
//! reproducible without a full Remote Store).

use std::collections::BTreeMap;

use crate::model::SnapshotVersion;
use crate::remote::remote_event::RemoteEvent;
use crate::remote::target::{QueryData, TargetId};
use crate::remote::watch_change::{ExistenceFilter, TargetChangeState, WatchChange};

/// The three outputs the aggregator produces from one pass (§4.3): the
/// consistent remote event, the updated pending-response counters, and the
/// existence filters the watch subsystem must reconcile next (§4.4).
pub struct AggregationResult {
    pub remote_event: RemoteEvent,
    pub pending_target_responses: BTreeMap<TargetId, u32>,
    pub existence_filters: BTreeMap<TargetId, ExistenceFilter>,
}

/// Folds a batch of raw watch changes against the outstanding listen targets
/// and pending-ack counters to produce a consistent remote event.
///
/// `pending_target_responses` is the table as it stood before this batch;
/// the returned table reflects every increment/decrement implied by the
/// `Added`/`Removed` target-changes in `changes`.
pub fn aggregate(
    snapshot_version: SnapshotVersion,
    listen_targets: &BTreeMap<TargetId, QueryData>,
    pending_target_responses: &BTreeMap<TargetId, u32>,
    changes: &[WatchChange],
) -> AggregationResult {
    let mut pending = pending_target_responses.clone();
    let mut event = RemoteEvent::new(snapshot_version);
    let mut existence_filters = BTreeMap::new();

    for change in changes {
        match change {
            WatchChange::TargetChange(target_change) => {
                apply_target_change(&mut event, &mut pending, target_change);
            }
            WatchChange::DocumentChange(doc_change) => {
                for target_id in &doc_change.updated_target_ids {
                    let already_present = event
                        .document_updates
                        .get(&doc_change.document.key)
                        .is_some();
                    let target = event.target_change_mut(*target_id);
                    if already_present {
                        target.modified_documents.insert(doc_change.document.key.clone());
                    } else {
                        target.added_documents.insert(doc_change.document.key.clone());
                    }
                }
                for target_id in &doc_change.removed_target_ids {
                    let target = event.target_change_mut(*target_id);
                    target.added_documents.remove(&doc_change.document.key);
                    target.modified_documents.remove(&doc_change.document.key);
                    target.removed_documents.insert(doc_change.document.key.clone());
                }
                event
                    .document_updates
                    .insert(doc_change.document.key.clone(), Some(doc_change.document.clone()));
            }
            WatchChange::DocumentDelete(delete) => {
                for target_id in &delete.removed_target_ids {
                    let target = event.target_change_mut(*target_id);
                    target.added_documents.remove(&delete.key);
                    target.modified_documents.remove(&delete.key);
                    target.removed_documents.insert(delete.key.clone());
                }
                event.document_updates.insert(delete.key.clone(), None);
            }
            WatchChange::DocumentRemove(remove) => {
                for target_id in &remove.removed_target_ids {
                    let target = event.target_change_mut(*target_id);
                    target.added_documents.remove(&remove.key);
                    target.modified_documents.remove(&remove.key);
                    target.removed_documents.insert(remove.key.clone());
                }
                event.document_updates.insert(remove.key.clone(), None);
            }
            WatchChange::ExistenceFilter(filter) => {
                existence_filters.insert(filter.target_id, *filter);
            }
        }
    }

    // Step 2: drop targets that are no longer listened to, or whose
    // acknowledgement is still outstanding (§4.3 step 2).
    event
        .target_changes
        .retain(|target_id, _| listen_targets.contains_key(target_id) && !pending.contains_key(target_id));

    AggregationResult {
        remote_event: event,
        pending_target_responses: pending,
        existence_filters,
    }
}

fn apply_target_change(
    event: &mut RemoteEvent,
    pending: &mut BTreeMap<TargetId, u32>,
    change: &crate::remote::watch_change::WatchTargetChange,
) {
    match change.state {
        TargetChangeState::Added | TargetChangeState::Removed => {
            for target_id in &change.target_ids {
                let remaining = pending.get(target_id).copied().unwrap_or(0);
                debug_assert!(remaining > 0, "pending-response decrement below zero for target {target_id}");
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    pending.remove(target_id);
                } else {
                    pending.insert(*target_id, remaining);
                }
            }
        }
        TargetChangeState::Current => {
            for target_id in &change.target_ids {
                event.target_change_mut(*target_id).current = true;
            }
        }
        TargetChangeState::Reset => {
            for target_id in &change.target_ids {
                let target = event.target_change_mut(*target_id);
                target.is_reset_mapping = true;
                target.added_documents.clear();
                target.modified_documents.clear();
                target.removed_documents.clear();
            }
        }
        TargetChangeState::NoChange => {}
    }

    if !change.resume_token.is_empty() {
        for target_id in &change.target_ids {
            event.target_change_mut(*target_id).resume_token = change.resume_token.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentKey, Timestamp};
    use crate::remote::target::{QueryPurpose, QueryTarget};
    use crate::remote::watch_change::{WatchDocument, WatchDocumentChange, WatchTargetChange};
    use crate::value::MapValue;

    fn listening(target_id: TargetId) -> BTreeMap<TargetId, QueryData> {
        let mut map = BTreeMap::new();
        map.insert(
            target_id,
            QueryData::new(QueryTarget::Document(DocumentKey::from_string("rooms/eros")), target_id, QueryPurpose::Listen),
        );
        map
    }

    #[test]
    fn aggregates_added_then_current_with_document() {
        let listen_targets = listening(1);
        let mut pending = BTreeMap::new();
        pending.insert(1, 1);

        let changes = vec![
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Added,
                target_ids: vec![1],
                resume_token: Vec::new(),
                cause: None,
            }),
            WatchChange::DocumentChange(WatchDocumentChange {
                updated_target_ids: vec![1],
                removed_target_ids: vec![],
                document: WatchDocument {
                    key: DocumentKey::from_string("rooms/eros"),
                    fields: MapValue::empty(),
                    update_time: Timestamp::new(5, 0),
                },
            }),
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Current,
                target_ids: vec![1],
                resume_token: b"t1".to_vec(),
                cause: None,
            }),
        ];

        let result = aggregate(Timestamp::new(5, 0), &listen_targets, &pending, &changes);
        assert!(result.pending_target_responses.is_empty());
        let target_change = result.remote_event.target_changes.get(&1).expect("target change present");
        assert!(target_change.current);
        assert_eq!(target_change.resume_token, b"t1");
        assert!(target_change.added_documents.contains(&DocumentKey::from_string("rooms/eros")));
    }

    #[test]
    fn excludes_targets_still_pending_acknowledgement() {
        let listen_targets = listening(1);
        let mut pending = BTreeMap::new();
        pending.insert(1, 2);

        let changes = vec![WatchChange::TargetChange(WatchTargetChange {
            state: TargetChangeState::Added,
            target_ids: vec![1],
            resume_token: Vec::new(),
            cause: None,
        })];

        let result = aggregate(Timestamp::new(1, 0), &listen_targets, &pending, &changes);
        assert_eq!(result.pending_target_responses.get(&1), Some(&1));
        assert!(!result.remote_event.target_changes.contains_key(&1));
    }

    #[test]
    fn excludes_targets_no_longer_listened_to() {
        let listen_targets: BTreeMap<TargetId, QueryData> = BTreeMap::new();
        let pending = BTreeMap::new();

        let changes = vec![WatchChange::TargetChange(WatchTargetChange {
            state: TargetChangeState::Current,
            target_ids: vec![9],
            resume_token: Vec::new(),
            cause: None,
        })];

        let result = aggregate(Timestamp::new(1, 0), &listen_targets, &pending, &changes);
        assert!(result.remote_event.target_changes.is_empty());
    }

    #[test]
    fn records_existence_filters_separately_from_target_changes() {
        let listen_targets = listening(2);
        let pending = BTreeMap::new();
        let changes = vec![WatchChange::ExistenceFilter(ExistenceFilter { target_id: 2, count: 2 })];
        let result = aggregate(Timestamp::new(1, 0), &listen_targets, &pending, &changes);
        assert_eq!(result.existence_filters.get(&2), Some(&ExistenceFilter { target_id: 2, count: 2 }));
        assert!(result.remote_event.target_changes.is_empty());
    }
}
