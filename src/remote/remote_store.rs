//! The Remote Store facade (C5, §4.6) and the watch/write subsystems it
//! drives (C3, C4). A single logical actor: every public method and every
//! stream callback funnels through [`RemoteStoreInner`]'s locked state, so
//! the sequences described in §4 execute atomically from the outside's
//! perspective (§5).

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Weak};

use async_lock::Mutex as AsyncMutex;
use async_trait::async_trait;

use crate::config::RemoteStoreConfig;
use crate::error::{RemoteStoreError, RemoteStoreResult};
use crate::model::{SnapshotVersion, Timestamp};
use crate::remote::aggregator::aggregate;
use crate::remote::datastore::Datastore;
use crate::remote::local_store::LocalStore;
use crate::remote::mutation::{BatchId, MutationBatch, MutationBatchResult, UNKNOWN_BATCH_ID};
use crate::remote::online_state::{OnlineState, OnlineStateDelegate, OnlineStateTracker};
use crate::remote::remote_event::RemoteEvent;
use crate::remote::streams::{WatchStream, WatchStreamDelegate, WriteStream, WriteStreamDelegate};
use crate::remote::sync_engine::SyncEngine;
use crate::remote::target::{QueryData, QueryPurpose, QueryTarget, TargetId};
use crate::remote::watch_change::{TargetChangeState, WatchChange};

/// State exclusively owned by the Remote Store and mutated only while
/// holding [`RemoteStoreInner::state`] (§5 "Shared resources").
struct State {
    listen_targets: BTreeMap<TargetId, QueryData>,
    pending_target_responses: BTreeMap<TargetId, u32>,
    accumulated_changes: Vec<WatchChange>,
    pending_writes: VecDeque<MutationBatch>,
    last_batch_seen: BatchId,
    watch_stream: Option<Arc<dyn WatchStream>>,
    write_stream: Option<Arc<dyn WriteStream>>,
    /// Tracked independently of `write_stream`'s own `handshake_complete()`:
    /// a stream implementation may reset its internal flag before invoking
    /// `on_write_stream_close`, so the Remote Store keeps its own record of
    /// whether the handshake was complete for the session that just ended
    /// (mirrors the reference codebase's `write_handshake_complete` field).
    write_handshake_complete: bool,
    online_state: OnlineStateTracker,
    online_state_delegate: Option<Arc<dyn OnlineStateDelegate>>,
}

impl State {
    fn new(failure_threshold: u32) -> Self {
        Self {
            listen_targets: BTreeMap::new(),
            pending_target_responses: BTreeMap::new(),
            accumulated_changes: Vec::new(),
            pending_writes: VecDeque::new(),
            last_batch_seen: UNKNOWN_BATCH_ID,
            watch_stream: None,
            write_stream: None,
            write_handshake_complete: false,
            online_state: OnlineStateTracker::new(failure_threshold),
            online_state_delegate: None,
        }
    }
}

/// Coordinates the watch and write streams, mediating between the local
/// store and the remote service (§2).
///
/// Cheap to clone: internally an `Arc` handle to the shared state, mirroring
/// how a host embeds a single store instance behind multiple call sites.
#[derive(Clone)]
pub struct RemoteStore {
    inner: Arc<RemoteStoreInner>,
}

impl RemoteStore {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        local_store: Arc<dyn LocalStore>,
        sync_engine: Arc<dyn SyncEngine>,
        config: RemoteStoreConfig,
    ) -> Self {
        let inner = Arc::new(RemoteStoreInner {
            state: AsyncMutex::new(State::new(config.online_state_failure_threshold)),
            datastore,
            local_store,
            sync_engine,
            config,
        });
        Self { inner }
    }

    /// Installs (or detaches, with `None`) the sink notified of online-state
    /// transitions (§6 "OnlineStateDelegate").
    pub async fn set_online_state_delegate(&self, delegate: Option<Arc<dyn OnlineStateDelegate>>) {
        self.inner.state.lock().await.online_state_delegate = delegate;
    }

    pub async fn online_state(&self) -> OnlineState {
        self.inner.state.lock().await.online_state.state()
    }

    /// Equivalent to [`Self::enable_network`] (§4.6).
    pub async fn start(&self) -> RemoteStoreResult<()> {
        self.inner.enable_network().await
    }

    pub async fn enable_network(&self) -> RemoteStoreResult<()> {
        self.inner.enable_network().await
    }

    pub async fn disable_network(&self) {
        self.inner.disable_network().await
    }

    pub async fn shutdown(&self) {
        self.inner.shutdown().await
    }

    pub async fn user_changed(&self) -> RemoteStoreResult<()> {
        self.inner.user_changed().await
    }

    pub async fn listen(&self, query_data: QueryData) {
        self.inner.listen(query_data).await
    }

    pub async fn unlisten(&self, target_id: TargetId) {
        self.inner.unlisten(target_id).await
    }

    /// Pulls as many batches as the pipeline has room for from the local
    /// store (§4.5 `fill_write_pipeline`). The host calls this after a
    /// `write()` accepted a new batch into local persistence.
    pub async fn fill_write_pipeline(&self) {
        self.inner.fill_write_pipeline().await
    }

    /// A thin factory off the datastore (§4.6, §1 Non-goals): transaction
    /// semantics run outside the streams and are not part of this core, so
    /// this just hands back the datastore handle a transaction would be
    /// built on.
    pub fn transaction(&self) -> Arc<dyn Datastore> {
        self.inner.datastore.clone()
    }
}

struct RemoteStoreInner {
    state: AsyncMutex<State>,
    datastore: Arc<dyn Datastore>,
    local_store: Arc<dyn LocalStore>,
    sync_engine: Arc<dyn SyncEngine>,
    config: RemoteStoreConfig,
}

impl RemoteStoreInner {
    fn should_start_watch_stream(state: &State) -> bool {
        match &state.watch_stream {
            Some(stream) => !stream.is_started() && !state.listen_targets.is_empty(),
            None => false,
        }
    }

    fn should_start_write_stream(state: &State) -> bool {
        match &state.write_stream {
            Some(stream) => !stream.is_started() && !state.pending_writes.is_empty(),
            None => false,
        }
    }

    fn can_write_mutations(state: &State, max_pending_writes: usize) -> bool {
        state.write_stream.is_some() && state.pending_writes.len() < max_pending_writes
    }

    fn increment_pending(pending: &mut BTreeMap<TargetId, u32>, target_id: TargetId) {
        *pending.entry(target_id).or_insert(0) += 1;
    }

    fn watch_delegate(self: &Arc<Self>) -> Arc<dyn WatchStreamDelegate> {
        Arc::new(WatchDelegate { inner: Arc::downgrade(self) })
    }

    fn write_delegate(self: &Arc<Self>) -> Arc<dyn WriteStreamDelegate> {
        Arc::new(WriteDelegate { inner: Arc::downgrade(self) })
    }

    // ---- Facade & lifecycle (§4.6) ----

    async fn enable_network(self: &Arc<Self>) -> RemoteStoreResult<()> {
        {
            let state = self.state.lock().await;
            assert!(
                state.watch_stream.is_none() && state.write_stream.is_none(),
                "enable_network called while network already enabled"
            );
        }
        log::debug!("enable_network: creating watch/write streams");

        let watch_stream = self.datastore.create_watch_stream().await?;
        let write_stream = self.datastore.create_write_stream().await?;

        let token = self.local_store.last_stream_token().await;
        write_stream.set_last_stream_token(token).await;

        let should_start = {
            let mut state = self.state.lock().await;
            state.watch_stream = Some(watch_stream.clone());
            state.write_stream = Some(write_stream.clone());
            {
                let State { online_state, online_state_delegate, .. } = &mut *state;
                online_state.mark_unknown(online_state_delegate.as_deref());
            }
            Self::should_start_watch_stream(&state)
        };

        if should_start {
            watch_stream.start(self.watch_delegate()).await;
        }

        self.fill_write_pipeline().await;
        Ok(())
    }

    async fn disable_network(self: &Arc<Self>) {
        log::debug!("disable_network: stopping watch/write streams");
        let (watch_stream, write_stream) = {
            let mut state = self.state.lock().await;
            {
                let State { online_state, online_state_delegate, .. } = &mut *state;
                online_state.force_failed(online_state_delegate.as_deref());
            }
            (state.watch_stream.take(), state.write_stream.take())
        };

        // Post-condition: stop() must be synchronous with respect to future
        // callbacks (§5 "Cancellation") before we touch transient state.
        if let Some(stream) = &watch_stream {
            stream.stop().await;
        }
        if let Some(stream) = &write_stream {
            stream.stop().await;
        }

        let mut state = self.state.lock().await;
        state.accumulated_changes.clear();
        state.pending_target_responses.clear();
        state.write_handshake_complete = false;
    }

    async fn shutdown(self: &Arc<Self>) {
        log::debug!("shutdown: detaching online-state delegate");
        {
            let mut state = self.state.lock().await;
            state.online_state_delegate = None;
        }
        let enabled = { self.state.lock().await.watch_stream.is_some() };
        if enabled {
            self.disable_network().await;
        }
    }

    async fn user_changed(self: &Arc<Self>) -> RemoteStoreResult<()> {
        log::debug!("user_changed: discarding pending writes and last_batch_seen");
        self.disable_network().await;
        {
            let mut state = self.state.lock().await;
            state.pending_writes.clear();
            state.last_batch_seen = UNKNOWN_BATCH_ID;
        }
        self.enable_network().await
    }

    // ---- Watch subsystem (C3, §4.2) ----

    async fn listen(self: &Arc<Self>, query_data: QueryData) {
        let target_id = query_data.target_id();
        log::debug!("listen: target {target_id}");
        let (stream, should_start, already_open) = {
            let mut state = self.state.lock().await;
            assert!(
                !state.listen_targets.contains_key(&target_id),
                "duplicate listen for target {target_id}"
            );
            state.listen_targets.insert(target_id, query_data.clone());
            let should_start = Self::should_start_watch_stream(&state);
            let already_open = state.watch_stream.as_ref().map(|s| s.is_open()).unwrap_or(false);
            (state.watch_stream.clone(), should_start, already_open)
        };

        let Some(stream) = stream else { return };
        if should_start {
            stream.start(self.watch_delegate()).await;
        } else if already_open {
            stream.watch_query(query_data).await;
            let mut state = self.state.lock().await;
            Self::increment_pending(&mut state.pending_target_responses, target_id);
        }
    }

    async fn unlisten(self: &Arc<Self>, target_id: TargetId) {
        log::debug!("unlisten: target {target_id}");
        let (stream, is_open, no_active_targets) = {
            let mut state = self.state.lock().await;
            assert!(
                state.listen_targets.remove(&target_id).is_some(),
                "unlisten of unknown target {target_id}"
            );
            let is_open = state.watch_stream.as_ref().map(|s| s.is_open()).unwrap_or(false);
            (state.watch_stream.clone(), is_open, state.listen_targets.is_empty())
        };

        let Some(stream) = stream else { return };
        if is_open {
            stream.unwatch_target(target_id).await;
            let mut state = self.state.lock().await;
            Self::increment_pending(&mut state.pending_target_responses, target_id);
        }
        if no_active_targets {
            stream.mark_idle().await;
        }
    }

    async fn on_watch_stream_open(self: &Arc<Self>) {
        log::debug!("watch stream open");
        let (stream, targets) = {
            let state = self.state.lock().await;
            (state.watch_stream.clone(), state.listen_targets.values().cloned().collect::<Vec<_>>())
        };
        let Some(stream) = stream else { return };
        for query_data in targets {
            let target_id = query_data.target_id();
            stream.watch_query(query_data).await;
            let mut state = self.state.lock().await;
            Self::increment_pending(&mut state.pending_target_responses, target_id);
        }
    }

    async fn on_watch_change(self: &Arc<Self>, change: WatchChange, snapshot_version: SnapshotVersion) {
        {
            let mut state = self.state.lock().await;
            let State { online_state, online_state_delegate, .. } = &mut *state;
            online_state.mark_message_received(online_state_delegate.as_deref());
        }

        if let WatchChange::TargetChange(target_change) = &change {
            if target_change.state == TargetChangeState::Removed {
                if let Some(cause) = target_change.cause.clone() {
                    self.process_target_error(&target_change.target_ids, cause).await;
                    return;
                }
            }
        }

        let last_remote_version = self.local_store.last_remote_snapshot_version().await;
        let carries_snapshot_version = Self::change_carries_snapshot_version(&change);
        let should_flush = {
            let mut state = self.state.lock().await;
            state.accumulated_changes.push(change);
            carries_snapshot_version && snapshot_version != Timestamp::NONE && snapshot_version >= last_remote_version
        };
        if should_flush {
            self.flush_accumulated_changes(snapshot_version).await;
        }
    }

    /// Only some watch-change kinds define a snapshot boundary the aggregator
    /// can flush on; a `DocumentChange`/`ExistenceFilter` piggybacks on
    /// whatever `TargetChange`/`DocumentDelete`/`DocumentRemove` closes out
    /// the batch, mirroring the reference codebase's
    /// `snapshot_version_for_change`.
    fn change_carries_snapshot_version(change: &WatchChange) -> bool {
        matches!(
            change,
            WatchChange::TargetChange(_) | WatchChange::DocumentDelete(_) | WatchChange::DocumentRemove(_)
        )
    }

    async fn on_watch_stream_closed(self: &Arc<Self>, error: Option<RemoteStoreError>) {
        {
            let state = self.state.lock().await;
            assert!(state.watch_stream.is_some(), "watch stream closed while network disabled");
        }
        log::debug!("watch stream closed");

        self.cleanup_watch_state().await;

        let (should_restart, stream) = {
            let mut state = self.state.lock().await;
            let has_active_listens = !state.listen_targets.is_empty();
            let should_restart = Self::should_start_watch_stream(&state);
            {
                let State { online_state, online_state_delegate, .. } = &mut *state;
                online_state.handle_watch_stream_closed(has_active_listens, online_state_delegate.as_deref());
            }
            (should_restart, state.watch_stream.clone())
        };

        if let Some(err) = &error {
            log::warn!("watch stream closed: {err}");
        }

        if should_restart {
            if let Some(stream) = stream {
                stream.start(self.watch_delegate()).await;
            }
        }
    }

    async fn cleanup_watch_state(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        state.accumulated_changes.clear();
        state.pending_target_responses.clear();
    }

    /// §4.2 "process_target_error": removes each named target and surfaces
    /// the cause to the sync engine, independent of accumulation (§9 open
    /// question — target errors are processed immediately).
    async fn process_target_error(self: &Arc<Self>, target_ids: &[TargetId], cause: RemoteStoreError) {
        log::warn!("target error: {cause} for targets {target_ids:?}");
        for &target_id in target_ids {
            let removed = {
                let mut state = self.state.lock().await;
                state.listen_targets.remove(&target_id).is_some()
            };
            if removed {
                self.sync_engine.reject_listen(target_id, cause.clone()).await;
            }
        }
    }

    async fn flush_accumulated_changes(self: &Arc<Self>, snapshot_version: SnapshotVersion) {
        let (changes, listen_targets, pending) = {
            let mut state = self.state.lock().await;
            let changes = std::mem::take(&mut state.accumulated_changes);
            (changes, state.listen_targets.clone(), state.pending_target_responses.clone())
        };

        let result = aggregate(snapshot_version, &listen_targets, &pending, &changes);

        {
            let mut state = self.state.lock().await;
            state.pending_target_responses = result.pending_target_responses;
        }

        let mut event = result.remote_event;
        self.reconcile_existence_filters(&mut event, &result.existence_filters).await;
        self.advance_resume_tokens(&event, snapshot_version).await;

        if !event.is_empty() {
            self.sync_engine.apply_remote_event(event).await;
        }
    }

    /// Existence-filter reconciliation (§4.4), run after the aggregator
    /// pass that produced `event`.
    async fn reconcile_existence_filters(
        self: &Arc<Self>,
        event: &mut RemoteEvent,
        filters: &BTreeMap<TargetId, crate::remote::watch_change::ExistenceFilter>,
    ) {
        for (&target_id, filter) in filters {
            let query_data = {
                let state = self.state.lock().await;
                state.listen_targets.get(&target_id).cloned()
            };
            let Some(query_data) = query_data else {
                continue; // target was removed in the meantime (§4.4 first bullet)
            };

            match query_data.query() {
                QueryTarget::Document(key) => match filter.count {
                    0 => {
                        event.document_updates.insert(key.clone(), None);
                    }
                    1 => {}
                    other => {
                        log::warn!("existence filter for document target {target_id} reported invalid count {other}");
                    }
                },
                QueryTarget::Collection { .. } => {
                    self.reconcile_collection_existence_filter(event, target_id, &query_data, filter.count).await;
                }
            }
        }
    }

    async fn reconcile_collection_existence_filter(
        self: &Arc<Self>,
        event: &mut RemoteEvent,
        target_id: TargetId,
        query_data: &QueryData,
        filter_count: u32,
    ) {
        let mut tracked_remote = self.local_store.remote_document_keys(target_id).await;
        if let Some(target_change) = event.target_changes.get(&target_id) {
            if target_change.is_reset_mapping {
                tracked_remote = target_change.added_documents.clone();
            } else {
                for key in &target_change.added_documents {
                    tracked_remote.insert(key.clone());
                }
                for key in &target_change.removed_documents {
                    tracked_remote.remove(key);
                }
            }
        }

        if tracked_remote.len() as u32 == filter_count {
            return;
        }

        log::warn!(
            "existence filter mismatch for target {target_id}: tracked {} vs reported {filter_count}",
            tracked_remote.len()
        );
        event.on_existence_filter_mismatch(target_id);

        let reset_query_data = query_data.reset();
        let stream = {
            let mut state = self.state.lock().await;
            state.listen_targets.insert(target_id, reset_query_data.clone());
            state.watch_stream.clone()
        };

        let Some(stream) = stream else { return };
        if !stream.is_open() {
            return; // the next `on_watch_stream_open` resends from `listen_targets`, already reset
        }

        stream.unwatch_target(target_id).await;
        let mismatch_query_data = reset_query_data.with_purpose(QueryPurpose::ExistenceFilterMismatch);
        stream.watch_query(mismatch_query_data).await;

        let mut state = self.state.lock().await;
        Self::increment_pending(&mut state.pending_target_responses, target_id);
        Self::increment_pending(&mut state.pending_target_responses, target_id);
    }

    /// Final paragraph of §4.4: advances resume tokens on still-active
    /// targets, enforcing I5 (non-regressing snapshot version).
    async fn advance_resume_tokens(self: &Arc<Self>, event: &RemoteEvent, snapshot_version: SnapshotVersion) {
        let mut state = self.state.lock().await;
        for (target_id, target_change) in &event.target_changes {
            if target_change.resume_token.is_empty() {
                continue;
            }
            if let Some(existing) = state.listen_targets.get(target_id) {
                if snapshot_version < existing.snapshot_version() {
                    continue;
                }
                let updated = existing.with_snapshot(snapshot_version, target_change.resume_token.clone());
                state.listen_targets.insert(*target_id, updated);
            }
        }
    }

    // ---- Write subsystem (C4, §4.5) ----

    async fn fill_write_pipeline(self: &Arc<Self>) {
        loop {
            let (can_write, last_batch_seen) = {
                let state = self.state.lock().await;
                (Self::can_write_mutations(&state, self.config.max_pending_writes), state.last_batch_seen)
            };
            if !can_write {
                break;
            }

            let Some(batch) = self.local_store.next_mutation_batch_after(last_batch_seen).await else {
                break;
            };
            self.commit_batch(batch).await;
        }

        let (should_mark_idle, stream) = {
            let state = self.state.lock().await;
            (state.pending_writes.is_empty(), state.write_stream.clone())
        };
        if should_mark_idle {
            if let Some(stream) = stream {
                stream.mark_idle().await;
            }
        }
    }

    async fn commit_batch(self: &Arc<Self>, batch: MutationBatch) {
        log::debug!("commit_batch: {}", batch.batch_id);
        let batch_for_write = batch.clone();
        let (stream, should_start, handshake_complete) = {
            let mut state = self.state.lock().await;
            state.last_batch_seen = batch.batch_id;
            state.pending_writes.push_back(batch);
            let should_start = Self::should_start_write_stream(&state);
            if should_start {
                state.write_handshake_complete = false;
            }
            (state.write_stream.clone(), should_start, state.write_handshake_complete)
        };

        let Some(stream) = stream else { return };
        if should_start {
            stream.start(self.write_delegate()).await;
        } else if handshake_complete {
            stream.write_mutations(batch_for_write).await;
        }
        // Otherwise the batch sits in `pending_writes` until the handshake
        // completes, at which point it is resent in full (§4.5
        // "Handshake-complete").
    }

    async fn on_write_stream_open(self: &Arc<Self>) {
        let stream = { self.state.lock().await.write_stream.clone() };
        if let Some(stream) = stream {
            log::debug!("write stream opened; sending handshake");
            stream.write_handshake().await;
        }
    }

    async fn on_write_handshake_complete(self: &Arc<Self>) {
        let (stream, token, batches) = {
            let mut state = self.state.lock().await;
            state.write_handshake_complete = true;
            let token = state.write_stream.as_ref().and_then(|s| s.last_stream_token());
            let batches = state.pending_writes.iter().cloned().collect::<Vec<_>>();
            (state.write_stream.clone(), token, batches)
        };

        self.local_store.set_last_stream_token(token).await;

        // Deliberately bypasses `can_write_mutations`: the pipeline was
        // already sized by `commit_batch` (§4.5 "Handshake-complete").
        let Some(stream) = stream else { return };
        for batch in batches {
            stream.write_mutations(batch).await;
        }
    }

    async fn on_write_response(self: &Arc<Self>, commit_version: SnapshotVersion, mutation_results: Vec<crate::remote::mutation::MutationResult>) {
        let (batch, stream_token) = {
            let mut state = self.state.lock().await;
            let batch = state
                .pending_writes
                .pop_front()
                .expect("write response with no outstanding pending batch");
            let token = state.write_stream.as_ref().and_then(|s| s.last_stream_token()).unwrap_or_default();
            (batch, token)
        };

        log::debug!("batch {} acked", batch.batch_id);
        let result = MutationBatchResult::new(batch, commit_version, mutation_results, stream_token);
        self.sync_engine.apply_successful_write(result).await;
        self.fill_write_pipeline().await;
    }

    async fn on_write_stream_closed(self: &Arc<Self>, error: Option<RemoteStoreError>) {
        // Snapshotted from `State` rather than queried live off the stream:
        // the stream may have already reset its own handshake flag before
        // invoking this close callback.
        let handshake_was_complete = {
            let mut state = self.state.lock().await;
            assert!(state.write_stream.is_some(), "write stream closed while network disabled");
            std::mem::replace(&mut state.write_handshake_complete, false)
        };

        if let Some(err) = error {
            let pending_nonempty = { !self.state.lock().await.pending_writes.is_empty() };
            if pending_nonempty {
                if handshake_was_complete {
                    self.handle_write_error(err).await;
                } else {
                    self.handle_handshake_error(err).await;
                }
            }
        }

        let (should_restart, stream) = {
            let state = self.state.lock().await;
            (Self::should_start_write_stream(&state), state.write_stream.clone())
        };
        if should_restart {
            if let Some(stream) = stream {
                stream.start(self.write_delegate()).await;
            }
        }
    }

    /// §4.5 "handle_handshake_error": clears the stream token, local and
    /// in-memory, so the next handshake starts clean.
    async fn handle_handshake_error(self: &Arc<Self>, err: RemoteStoreError) {
        if self.datastore.is_permanent_write_error(&err) || self.datastore.is_aborted(&err) {
            log::warn!("handshake error, clearing stream token: {err}");
            let stream = { self.state.lock().await.write_stream.clone() };
            if let Some(stream) = &stream {
                stream.set_last_stream_token(None).await;
            }
            self.local_store.set_last_stream_token(None).await;
        }
    }

    /// §4.5 "handle_write_error": transient errors are left for the
    /// stream's own backoff; permanent ones reject the oldest batch and
    /// keep the pipeline moving.
    async fn handle_write_error(self: &Arc<Self>, err: RemoteStoreError) {
        if !self.datastore.is_permanent_write_error(&err) {
            return;
        }
        log::warn!("permanent write error, rejecting oldest batch: {err}");

        let (batch, stream) = {
            let mut state = self.state.lock().await;
            (state.pending_writes.pop_front(), state.write_stream.clone())
        };
        let Some(batch) = batch else { return };
        if let Some(stream) = &stream {
            stream.inhibit_backoff();
        }
        self.sync_engine.reject_failed_write(batch.batch_id, err).await;
        self.fill_write_pipeline().await;
    }
}

struct WatchDelegate {
    inner: Weak<RemoteStoreInner>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WatchStreamDelegate for WatchDelegate {
    async fn on_open(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_watch_stream_open().await;
        }
    }

    async fn on_watch_change(&self, change: WatchChange, snapshot_version: SnapshotVersion) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_watch_change(change, snapshot_version).await;
        }
    }

    async fn on_watch_stream_close(&self, error: Option<RemoteStoreError>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_watch_stream_closed(error).await;
        }
    }
}

struct WriteDelegate {
    inner: Weak<RemoteStoreInner>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl WriteStreamDelegate for WriteDelegate {
    async fn on_open(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_write_stream_open().await;
        }
    }

    async fn on_handshake_complete(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_write_handshake_complete().await;
        }
    }

    async fn on_write_response(&self, commit_version: SnapshotVersion, mutation_results: Vec<crate::remote::mutation::MutationResult>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_write_response(commit_version, mutation_results).await;
        }
    }

    async fn on_write_stream_close(&self, error: Option<RemoteStoreError>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_write_stream_closed(error).await;
        }
    }
}
