use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::model::{DocumentKey, SnapshotVersion};
use crate::remote::mutation::{BatchId, MutationBatch};
use crate::remote::target::TargetId;

/// The local persistence layer this core reads from and writes small pieces
/// of bookkeeping into. Its storage format and query evaluation are out of
/// scope (§1); only the contract matters here (§6 "LocalStore").
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Monotone in `after`: returns the next batch with `batch_id > after`,
    /// or `None` if the local store has nothing further queued.
    async fn next_mutation_batch_after(&self, after: BatchId) -> Option<MutationBatch>;

    /// The remote document keys the local store currently believes belong to
    /// `target_id`'s result set (used by existence-filter reconciliation,
    /// §4.4).
    async fn remote_document_keys(&self, target_id: TargetId) -> BTreeSet<DocumentKey>;

    /// The snapshot version of the most recent remote event successfully
    /// applied (§4.2 step 3).
    async fn last_remote_snapshot_version(&self) -> SnapshotVersion;

    /// The opaque write-stream token persisted verbatim across sessions.
    async fn last_stream_token(&self) -> Option<Vec<u8>>;

    async fn set_last_stream_token(&self, token: Option<Vec<u8>>);
}
