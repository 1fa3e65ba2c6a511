//! An in-memory, channel-backed test double for `WatchStream`/`WriteStream`.
//!
//! Grounded on the reference codebase's multiplexed in-memory transport,
//! which loops two `async-channel` endpoints together for tests; this is
//! the same idea narrowed to typed domain values instead of raw bytes,
//! since wire encoding is out of scope here (§1 Non-goals). Tests script
//! server behavior by sending `WatchServerEvent`/`WriteServerEvent`s and
//! assert on outbound calls recorded in `outbound_calls()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_lock::Mutex as AsyncMutex;
use async_trait::async_trait;

use crate::error::RemoteStoreError;
use crate::model::SnapshotVersion;
use crate::platform;
use crate::remote::datastore::Datastore;
use crate::remote::mutation::{MutationBatch, MutationResult};
use crate::remote::streams::{WatchStream, WatchStreamDelegate, WriteStream, WriteStreamDelegate};
use crate::remote::target::{QueryData, TargetId};
use crate::remote::watch_change::WatchChange;

/// A server-originated event scripted onto a [`TestWatchStream`].
#[derive(Clone, Debug)]
pub enum WatchServerEvent {
    Open,
    Change(WatchChange, SnapshotVersion),
    Close(Option<RemoteStoreError>),
}

/// A server-originated event scripted onto a [`TestWriteStream`].
#[derive(Clone, Debug)]
pub enum WriteServerEvent {
    Open,
    HandshakeComplete,
    Response(SnapshotVersion, Vec<MutationResult>),
    Close(Option<RemoteStoreError>),
}

/// An outbound call the Remote Store made on a [`TestWatchStream`], recorded
/// for test assertions.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchOutboundCall {
    Watch(QueryData),
    Unwatch(TargetId),
    MarkIdle,
}

/// An outbound call the Remote Store made on a [`TestWriteStream`].
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutboundCall {
    Handshake,
    Write(MutationBatch),
    MarkIdle,
    InhibitBackoff,
}

type WatchDelegateSlot = Arc<AsyncMutex<Option<Arc<dyn WatchStreamDelegate>>>>;

pub struct TestWatchStream {
    delegate: WatchDelegateSlot,
    started: Arc<AtomicBool>,
    open: Arc<AtomicBool>,
    outbound: Arc<Mutex<Vec<WatchOutboundCall>>>,
    server_tx: async_channel::Sender<WatchServerEvent>,
    server_rx: async_channel::Receiver<WatchServerEvent>,
}

impl TestWatchStream {
    pub fn new() -> Arc<Self> {
        let (server_tx, server_rx) = async_channel::unbounded();
        Arc::new(Self {
            delegate: Arc::new(AsyncMutex::new(None)),
            started: Arc::new(AtomicBool::new(false)),
            open: Arc::new(AtomicBool::new(false)),
            outbound: Arc::new(Mutex::new(Vec::new())),
            server_tx,
            server_rx,
        })
    }

    /// Script a server event onto this stream; delivered asynchronously to
    /// whatever delegate `start()` was last called with.
    pub async fn push_server_event(&self, event: WatchServerEvent) {
        let _ = self.server_tx.send(event).await;
    }

    pub fn outbound_calls(&self) -> Vec<WatchOutboundCall> {
        self.outbound.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatchStream for TestWatchStream {
    async fn start(&self, delegate: Arc<dyn WatchStreamDelegate>) {
        *self.delegate.lock().await = Some(delegate);
        self.started.store(true, Ordering::SeqCst);

        let rx = self.server_rx.clone();
        let open_flag = self.open.clone();
        let started_flag = self.started.clone();
        let delegate_slot = self.delegate.clone();
        platform::spawn_detached(async move {
            while let Ok(event) = rx.recv().await {
                let delegate = delegate_slot.lock().await.clone();
                let Some(delegate) = delegate else { break };
                match event {
                    WatchServerEvent::Open => {
                        open_flag.store(true, Ordering::SeqCst);
                        delegate.on_open().await;
                    }
                    WatchServerEvent::Change(change, version) => {
                        delegate.on_watch_change(change, version).await;
                    }
                    WatchServerEvent::Close(error) => {
                        open_flag.store(false, Ordering::SeqCst);
                        started_flag.store(false, Ordering::SeqCst);
                        delegate.on_watch_stream_close(error).await;
                        break;
                    }
                }
            }
        });
    }

    async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        *self.delegate.lock().await = None;
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn mark_idle(&self) {
        self.outbound.lock().unwrap().push(WatchOutboundCall::MarkIdle);
    }

    async fn watch_query(&self, query_data: QueryData) {
        self.outbound.lock().unwrap().push(WatchOutboundCall::Watch(query_data));
    }

    async fn unwatch_target(&self, target_id: TargetId) {
        self.outbound.lock().unwrap().push(WatchOutboundCall::Unwatch(target_id));
    }
}

type WriteDelegateSlot = Arc<AsyncMutex<Option<Arc<dyn WriteStreamDelegate>>>>;

pub struct TestWriteStream {
    delegate: WriteDelegateSlot,
    started: Arc<AtomicBool>,
    handshake_complete: Arc<AtomicBool>,
    stream_token: Mutex<Option<Vec<u8>>>,
    backoff_inhibited: AtomicBool,
    outbound: Arc<Mutex<Vec<WriteOutboundCall>>>,
    server_tx: async_channel::Sender<WriteServerEvent>,
    server_rx: async_channel::Receiver<WriteServerEvent>,
}

impl TestWriteStream {
    pub fn new() -> Arc<Self> {
        let (server_tx, server_rx) = async_channel::unbounded();
        Arc::new(Self {
            delegate: Arc::new(AsyncMutex::new(None)),
            started: Arc::new(AtomicBool::new(false)),
            handshake_complete: Arc::new(AtomicBool::new(false)),
            stream_token: Mutex::new(None),
            backoff_inhibited: AtomicBool::new(false),
            outbound: Arc::new(Mutex::new(Vec::new())),
            server_tx,
            server_rx,
        })
    }

    pub async fn push_server_event(&self, event: WriteServerEvent) {
        let _ = self.server_tx.send(event).await;
    }

    pub fn outbound_calls(&self) -> Vec<WriteOutboundCall> {
        self.outbound.lock().unwrap().clone()
    }

    pub fn backoff_inhibited(&self) -> bool {
        self.backoff_inhibited.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WriteStream for TestWriteStream {
    async fn start(&self, delegate: Arc<dyn WriteStreamDelegate>) {
        *self.delegate.lock().await = Some(delegate);
        self.started.store(true, Ordering::SeqCst);

        let rx = self.server_rx.clone();
        let handshake_flag = self.handshake_complete.clone();
        let started_flag = self.started.clone();
        let delegate_slot = self.delegate.clone();
        platform::spawn_detached(async move {
            while let Ok(event) = rx.recv().await {
                let delegate = delegate_slot.lock().await.clone();
                let Some(delegate) = delegate else { break };
                match event {
                    WriteServerEvent::Open => delegate.on_open().await,
                    WriteServerEvent::HandshakeComplete => {
                        handshake_flag.store(true, Ordering::SeqCst);
                        delegate.on_handshake_complete().await;
                    }
                    WriteServerEvent::Response(version, results) => {
                        delegate.on_write_response(version, results).await;
                    }
                    WriteServerEvent::Close(error) => {
                        handshake_flag.store(false, Ordering::SeqCst);
                        started_flag.store(false, Ordering::SeqCst);
                        delegate.on_write_stream_close(error).await;
                        break;
                    }
                }
            }
        });
    }

    async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.handshake_complete.store(false, Ordering::SeqCst);
        *self.delegate.lock().await = None;
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn handshake_complete(&self) -> bool {
        self.handshake_complete.load(Ordering::SeqCst)
    }

    fn last_stream_token(&self) -> Option<Vec<u8>> {
        self.stream_token.lock().unwrap().clone()
    }

    async fn set_last_stream_token(&self, token: Option<Vec<u8>>) {
        *self.stream_token.lock().unwrap() = token;
    }

    async fn write_handshake(&self) {
        self.outbound.lock().unwrap().push(WriteOutboundCall::Handshake);
    }

    async fn write_mutations(&self, batch: MutationBatch) {
        self.outbound.lock().unwrap().push(WriteOutboundCall::Write(batch));
    }

    async fn mark_idle(&self) {
        self.outbound.lock().unwrap().push(WriteOutboundCall::MarkIdle);
    }

    fn inhibit_backoff(&self) {
        self.backoff_inhibited.store(true, Ordering::SeqCst);
        self.outbound.lock().unwrap().push(WriteOutboundCall::InhibitBackoff);
    }
}

/// A `Datastore` that simply vends pre-built test streams and classifies
/// errors by a caller-supplied predicate.
pub struct TestDatastore {
    watch_stream: Arc<TestWatchStream>,
    write_stream: Arc<TestWriteStream>,
    permanent_error_codes: Vec<crate::error::RemoteStoreErrorCode>,
    aborted_codes: Vec<crate::error::RemoteStoreErrorCode>,
}

impl TestDatastore {
    pub fn new(watch_stream: Arc<TestWatchStream>, write_stream: Arc<TestWriteStream>) -> Self {
        Self {
            watch_stream,
            write_stream,
            permanent_error_codes: vec![crate::error::RemoteStoreErrorCode::PermanentTransport],
            aborted_codes: Vec::new(),
        }
    }
}

#[async_trait]
impl Datastore for TestDatastore {
    async fn create_watch_stream(&self) -> Result<Arc<dyn WatchStream>, RemoteStoreError> {
        Ok(self.watch_stream.clone())
    }

    async fn create_write_stream(&self) -> Result<Arc<dyn WriteStream>, RemoteStoreError> {
        Ok(self.write_stream.clone())
    }

    fn is_permanent_write_error(&self, error: &RemoteStoreError) -> bool {
        self.permanent_error_codes.contains(&error.code())
    }

    fn is_aborted(&self, error: &RemoteStoreError) -> bool {
        self.aborted_codes.contains(&error.code())
    }
}
