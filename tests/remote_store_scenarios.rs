//! End-to-end scenarios S1-S6 and invariant/round-trip properties P1-P7,
//! R1-R2, driven through the public facade against the in-memory stream test
//! doubles and simple in-memory `LocalStore`/`SyncEngine` collaborators.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use async_lock::Mutex as TestMutex;
use async_trait::async_trait;

use firestore_remote_store::config::RemoteStoreConfig;
use firestore_remote_store::error::{permanent_transport, RemoteStoreError};
use firestore_remote_store::model::{DocumentKey, ResourcePath, SnapshotVersion, Timestamp};
use firestore_remote_store::platform;
use firestore_remote_store::remote::streams::test_double::{
    TestDatastore, TestWatchStream, TestWriteStream, WatchOutboundCall, WatchServerEvent,
    WriteOutboundCall, WriteServerEvent,
};
use firestore_remote_store::remote::{
    BatchId, ExistenceFilter, LocalStore, Mutation, MutationBatch, MutationBatchResult,
    MutationResult, OnlineState, OnlineStateDelegate, QueryData, QueryPurpose, QueryTarget,
    RemoteEvent, RemoteStore, SyncEngine, TargetChangeState, TargetId, WatchChange, WatchDocument,
    WatchDocumentChange, WatchTargetChange,
};
use firestore_remote_store::value::MapValue;

#[derive(Default)]
struct InMemoryLocalStore {
    batches: TestMutex<VecDeque<MutationBatch>>,
    last_remote_snapshot_version: TestMutex<SnapshotVersion>,
    last_stream_token: TestMutex<Option<Vec<u8>>>,
    remote_keys: TestMutex<BTreeMap<TargetId, BTreeSet<DocumentKey>>>,
}

impl InMemoryLocalStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            last_remote_snapshot_version: TestMutex::new(Timestamp::NONE),
            ..Default::default()
        })
    }

    async fn push_batches(&self, batches: Vec<MutationBatch>) {
        self.batches.lock().await.extend(batches);
    }

    async fn set_remote_keys(&self, target_id: TargetId, keys: BTreeSet<DocumentKey>) {
        self.remote_keys.lock().await.insert(target_id, keys);
    }
}

#[async_trait]
impl LocalStore for InMemoryLocalStore {
    async fn next_mutation_batch_after(&self, after: BatchId) -> Option<MutationBatch> {
        let mut batches = self.batches.lock().await;
        let index = batches.iter().position(|b| b.batch_id > after)?;
        Some(batches.remove(index).unwrap())
    }

    async fn remote_document_keys(&self, target_id: TargetId) -> BTreeSet<DocumentKey> {
        self.remote_keys.lock().await.get(&target_id).cloned().unwrap_or_default()
    }

    async fn last_remote_snapshot_version(&self) -> SnapshotVersion {
        *self.last_remote_snapshot_version.lock().await
    }

    async fn last_stream_token(&self) -> Option<Vec<u8>> {
        self.last_stream_token.lock().await.clone()
    }

    async fn set_last_stream_token(&self, token: Option<Vec<u8>>) {
        *self.last_stream_token.lock().await = token;
    }
}

#[derive(Default)]
struct RecordingSyncEngine {
    events: TestMutex<Vec<RemoteEvent>>,
    rejected_listens: TestMutex<Vec<TargetId>>,
    successful_writes: TestMutex<Vec<MutationBatchResult>>,
    rejected_writes: TestMutex<Vec<BatchId>>,
}

impl RecordingSyncEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SyncEngine for RecordingSyncEngine {
    async fn apply_remote_event(&self, event: RemoteEvent) {
        self.events.lock().await.push(event);
    }

    async fn reject_listen(&self, target_id: TargetId, _error: RemoteStoreError) {
        self.rejected_listens.lock().await.push(target_id);
    }

    async fn apply_successful_write(&self, result: MutationBatchResult) {
        self.successful_writes.lock().await.push(result);
    }

    async fn reject_failed_write(&self, batch_id: BatchId, _error: RemoteStoreError) {
        self.rejected_writes.lock().await.push(batch_id);
    }
}

fn sample_query_data(target_id: TargetId) -> QueryData {
    QueryData::new(QueryTarget::Document(DocumentKey::from_string("rooms/eros")), target_id, QueryPurpose::Listen)
}

fn collection_query_data(target_id: TargetId) -> QueryData {
    QueryData::new(
        QueryTarget::Collection { parent: ResourcePath::root(), collection_id: "rooms".into() },
        target_id,
        QueryPurpose::Listen,
    )
}

struct Harness {
    store: RemoteStore,
    watch_stream: Arc<TestWatchStream>,
    write_stream: Arc<TestWriteStream>,
    local_store: Arc<InMemoryLocalStore>,
    sync_engine: Arc<RecordingSyncEngine>,
}

fn build_harness() -> Harness {
    let _ = env_logger::try_init();
    let watch_stream = TestWatchStream::new();
    let write_stream = TestWriteStream::new();
    let datastore = Arc::new(TestDatastore::new(watch_stream.clone(), write_stream.clone()));
    let local_store = InMemoryLocalStore::new();
    let sync_engine = RecordingSyncEngine::new();
    let store = RemoteStore::new(datastore, local_store.clone(), sync_engine.clone(), RemoteStoreConfig::default());
    Harness { store, watch_stream, write_stream, local_store, sync_engine }
}

/// Gives the test double's background delivery task a chance to run; there
/// is no suspension point in the facade itself to synchronize on (§5).
async fn settle() {
    for _ in 0..5 {
        platform::yield_now().await;
    }
}

#[tokio::test]
async fn s1_listen_healthy_snapshot() {
    let h = build_harness();
    h.store.enable_network().await.expect("enable network");
    h.store.listen(sample_query_data(1)).await;
    settle().await;

    h.watch_stream.push_server_event(WatchServerEvent::Open).await;
    settle().await;
    assert_eq!(h.store.online_state().await, OnlineState::Unknown);

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Added,
                target_ids: vec![1],
                resume_token: Vec::new(),
                cause: None,
            }),
            Timestamp::new(5, 0),
        ))
        .await;
    settle().await;
    assert_eq!(h.store.online_state().await, OnlineState::Healthy);

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::DocumentChange(WatchDocumentChange {
                updated_target_ids: vec![1],
                removed_target_ids: vec![],
                document: WatchDocument {
                    key: DocumentKey::from_string("rooms/eros"),
                    fields: MapValue::empty(),
                    update_time: Timestamp::new(5, 0),
                },
            }),
            Timestamp::NONE,
        ))
        .await;
    settle().await;

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Current,
                target_ids: vec![1],
                resume_token: b"t1".to_vec(),
                cause: None,
            }),
            Timestamp::new(5, 0),
        ))
        .await;
    settle().await;

    let events = h.sync_engine.events.lock().await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.snapshot_version, Timestamp::new(5, 0));
    let target_change = event.target_changes.get(&1).expect("target change present");
    assert!(target_change.current);
    assert_eq!(target_change.resume_token, b"t1");
    assert!(target_change.added_documents.contains(&DocumentKey::from_string("rooms/eros")));
}

#[tokio::test]
async fn s2_write_pipeline_bound() {
    let h = build_harness();
    let batches: Vec<MutationBatch> = (0..12)
        .map(|i| MutationBatch::new(i, vec![Mutation::Delete { key: DocumentKey::from_string("rooms/eros") }]))
        .collect();
    h.local_store.push_batches(batches).await;

    h.store.enable_network().await.expect("enable network");
    settle().await;

    {
        let outbound = h.write_stream.outbound_calls();
        let handshakes = outbound.iter().filter(|c| matches!(c, WriteOutboundCall::Handshake)).count();
        assert_eq!(handshakes, 0, "no handshake sent before stream open");
    }

    h.write_stream.push_server_event(WriteServerEvent::Open).await;
    settle().await;
    h.write_stream.push_server_event(WriteServerEvent::HandshakeComplete).await;
    settle().await;

    let writes = h
        .write_stream
        .outbound_calls()
        .into_iter()
        .filter_map(|c| if let WriteOutboundCall::Write(b) = c { Some(b.batch_id) } else { None })
        .collect::<Vec<_>>();
    assert_eq!(writes, (0..10).collect::<Vec<_>>(), "pipeline bounded at MAX_PENDING_WRITES");

    for i in 0..10 {
        h.write_stream
            .push_server_event(WriteServerEvent::Response(Timestamp::new(i as i64, 0), vec![MutationResult { update_time: None }]))
            .await;
        settle().await;
    }

    let writes = h
        .write_stream
        .outbound_calls()
        .into_iter()
        .filter_map(|c| if let WriteOutboundCall::Write(b) = c { Some(b.batch_id) } else { None })
        .collect::<Vec<_>>();
    assert_eq!(writes, (0..12).collect::<Vec<_>>(), "freed slots are refilled in order");

    for i in 10..12 {
        h.write_stream
            .push_server_event(WriteServerEvent::Response(Timestamp::new(i as i64, 0), vec![MutationResult { update_time: None }]))
            .await;
        settle().await;
    }

    let successful = h.sync_engine.successful_writes.lock().await;
    assert_eq!(successful.len(), 12);
    let ids: Vec<BatchId> = successful.iter().map(|r| r.batch.batch_id).collect();
    assert_eq!(ids, (0..12).collect::<Vec<_>>(), "P7: acks applied in FIFO order");
}

#[tokio::test]
async fn s3_existence_filter_mismatch() {
    let h = build_harness();
    h.local_store
        .set_remote_keys(
            2,
            BTreeSet::from([
                DocumentKey::from_string("rooms/a"),
                DocumentKey::from_string("rooms/b"),
                DocumentKey::from_string("rooms/c"),
            ]),
        )
        .await;

    h.store.enable_network().await.expect("enable network");
    h.store.listen(collection_query_data(2)).await;
    settle().await;
    h.watch_stream.push_server_event(WatchServerEvent::Open).await;
    settle().await;

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Added,
                target_ids: vec![2],
                resume_token: Vec::new(),
                cause: None,
            }),
            Timestamp::NONE,
        ))
        .await;
    settle().await;

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::ExistenceFilter(ExistenceFilter { target_id: 2, count: 2 }),
            Timestamp::NONE,
        ))
        .await;
    settle().await;

    h.watch_stream
        .push_server_event(WatchServerEvent::Change(
            WatchChange::TargetChange(WatchTargetChange {
                state: TargetChangeState::Current,
                target_ids: vec![2],
                resume_token: Vec::new(),
                cause: None,
            }),
            Timestamp::new(1, 0),
        ))
        .await;
    settle().await;

    {
        let events = h.sync_engine.events.lock().await;
        assert!(events.iter().any(|e| e.existence_filter_mismatches().contains(&2)));
    }

    let outbound = h.watch_stream.outbound_calls();
    assert!(outbound.contains(&WatchOutboundCall::Unwatch(2)));
    let mismatch_watch = outbound.iter().find_map(|c| match c {
        WatchOutboundCall::Watch(q) if q.target_id() == 2 && q.purpose() == QueryPurpose::ExistenceFilterMismatch => Some(q.clone()),
        _ => None,
    });
    let mismatch_watch = mismatch_watch.expect("expected a re-listen watch with mismatch purpose");
    assert!(mismatch_watch.resume_token().is_empty());
}

#[tokio::test]
async fn s4_permanent_write_error_after_handshake() {
    let h = build_harness();
    h.local_store
        .push_batches(vec![
            MutationBatch::new(0, vec![Mutation::Delete { key: DocumentKey::from_string("rooms/a") }]),
            MutationBatch::new(1, vec![Mutation::Delete { key: DocumentKey::from_string("rooms/b") }]),
        ])
        .await;
    h.store.enable_network().await.expect("enable network");
    settle().await;
    h.write_stream.push_server_event(WriteServerEvent::Open).await;
    settle().await;
    h.write_stream.push_server_event(WriteServerEvent::HandshakeComplete).await;
    settle().await;

    h.write_stream.push_server_event(WriteServerEvent::Close(Some(permanent_transport("boom")))).await;
    settle().await;

    assert_eq!(*h.sync_engine.rejected_writes.lock().await, vec![0]);
    assert!(h.write_stream.backoff_inhibited());
}

#[tokio::test]
async fn s5_two_transient_watch_failures() {
    let h = build_harness();
    h.store.enable_network().await.expect("enable network");
    h.store.listen(sample_query_data(1)).await;
    settle().await;

    h.watch_stream.push_server_event(WatchServerEvent::Open).await;
    settle().await;

    h.watch_stream.push_server_event(WatchServerEvent::Close(None)).await;
    settle().await;
    assert_eq!(h.store.online_state().await, OnlineState::Unknown);

    h.watch_stream.push_server_event(WatchServerEvent::Open).await;
    settle().await;
    h.watch_stream.push_server_event(WatchServerEvent::Close(None)).await;
    settle().await;

    assert_eq!(h.store.online_state().await, OnlineState::Failed);
}

#[tokio::test]
async fn s6_user_change_resets_write_pipeline() {
    let h = build_harness();
    h.local_store
        .push_batches(vec![MutationBatch::new(0, vec![Mutation::Delete { key: DocumentKey::from_string("rooms/a") }])])
        .await;
    h.store.enable_network().await.expect("enable network");
    settle().await;

    h.store.user_changed().await.expect("user changed");
    settle().await;

    h.local_store
        .push_batches(vec![MutationBatch::new(5, vec![Mutation::Delete { key: DocumentKey::from_string("rooms/b") }])])
        .await;
    h.store.fill_write_pipeline().await;
    settle().await;

    let outbound = h.write_stream.outbound_calls();
    assert!(outbound.iter().any(|c| matches!(c, WriteOutboundCall::Handshake)), "pipeline recreated the write stream after the user change");
}

#[tokio::test]
async fn r1_listen_then_unlisten_round_trips() {
    let h = build_harness();
    h.store.enable_network().await.expect("enable network");
    settle().await;
    h.watch_stream.push_server_event(WatchServerEvent::Open).await;
    settle().await;

    h.store.listen(sample_query_data(9)).await;
    settle().await;
    h.store.unlisten(9).await;
    settle().await;

    // `listen` asserts on a duplicate target_id; if the table still held an
    // entry for 9 this would panic, so a second successful listen is proof
    // the unlisten fully rolled the bookkeeping back.
    h.store.listen(sample_query_data(9)).await;
}

#[tokio::test]
async fn r2_disable_then_enable_notifies_failed_then_unknown() {
    let h = build_harness();
    h.store.enable_network().await.expect("enable network");
    settle().await;

    #[derive(Default)]
    struct Recorder(TestMutex<Vec<OnlineState>>);
    impl OnlineStateDelegate for Recorder {
        fn on_watch_stream_online_state_changed(&self, new_state: OnlineState) {
            if let Ok(mut seen) = self.0.try_lock() {
                seen.push(new_state);
            }
        }
    }
    let recorder = Arc::new(Recorder::default());
    h.store.set_online_state_delegate(Some(recorder.clone())).await;

    h.store.disable_network().await;
    h.store.enable_network().await.expect("re-enable");

    let seen = recorder.0.lock().await.clone();
    assert_eq!(seen, vec![OnlineState::Failed, OnlineState::Unknown]);
}
