use async_trait::async_trait;

use crate::error::RemoteStoreError;
use crate::remote::mutation::{BatchId, MutationBatchResult};
use crate::remote::remote_event::RemoteEvent;
use crate::remote::target::TargetId;

/// The collaborator that receives remote events and write outcomes and owns
/// every user-visible consequence of them (§6 "SyncEngine"). Its own
/// reconciliation with the public query/document API is out of scope (§1).
#[async_trait]
pub trait SyncEngine: Send + Sync {
    async fn apply_remote_event(&self, event: RemoteEvent);
    async fn reject_listen(&self, target_id: TargetId, error: RemoteStoreError);
    async fn apply_successful_write(&self, result: MutationBatchResult);
    async fn reject_failed_write(&self, batch_id: BatchId, error: RemoteStoreError);
}
