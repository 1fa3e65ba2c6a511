pub mod test_double;

pub use test_double::{TestDatastore, TestWatchStream, TestWriteStream};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RemoteStoreError;
use crate::model::SnapshotVersion;
use crate::remote::mutation::{MutationBatch, MutationResult};
use crate::remote::target::{QueryData, TargetId};
use crate::remote::watch_change::WatchChange;

/// Delegate methods the watch stream calls back into the Remote Store with
/// (§6 "WatchStream" events).
///
/// Async rather than a plain callback: every one of these hooks needs to
/// take the Remote Store's internal lock and, on the change path, run an
/// aggregator pass — modelled as `async fn` so the single task driving a
/// stream's event loop awaits each callback to completion before delivering
/// the next one (§5: "all sequences in §4 execute atomically").
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WatchStreamDelegate: Send + Sync {
    async fn on_open(&self);
    async fn on_watch_change(&self, change: WatchChange, snapshot_version: SnapshotVersion);
    async fn on_watch_stream_close(&self, error: Option<RemoteStoreError>);
}

/// Control surface of the long-lived watch stream (§6 "WatchStream").
#[async_trait]
pub trait WatchStream: Send + Sync {
    async fn start(&self, delegate: Arc<dyn WatchStreamDelegate>);
    async fn stop(&self);
    fn is_started(&self) -> bool;
    fn is_open(&self) -> bool;
    async fn mark_idle(&self);
    async fn watch_query(&self, query_data: QueryData);
    async fn unwatch_target(&self, target_id: TargetId);
}

/// Delegate methods the write stream calls back into the Remote Store with
/// (§6 "WriteStream" events).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WriteStreamDelegate: Send + Sync {
    async fn on_open(&self);
    async fn on_handshake_complete(&self);
    async fn on_write_response(&self, commit_version: SnapshotVersion, mutation_results: Vec<MutationResult>);
    async fn on_write_stream_close(&self, error: Option<RemoteStoreError>);
}

/// Control surface of the long-lived write stream (§6 "WriteStream").
#[async_trait]
pub trait WriteStream: Send + Sync {
    async fn start(&self, delegate: Arc<dyn WriteStreamDelegate>);
    async fn stop(&self);
    fn is_started(&self) -> bool;
    fn handshake_complete(&self) -> bool;
    fn last_stream_token(&self) -> Option<Vec<u8>>;
    async fn set_last_stream_token(&self, token: Option<Vec<u8>>);
    async fn write_handshake(&self);
    async fn write_mutations(&self, batch: MutationBatch);
    async fn mark_idle(&self);
    /// The next reconnect attempt should not apply backoff: the previous
    /// failure was request-specific, not a transport problem (§4.5
    /// "handle_write_error").
    fn inhibit_backoff(&self);
}
