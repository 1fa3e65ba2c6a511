use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RemoteStoreError;
use crate::remote::streams::{WatchStream, WriteStream};

/// Transport factory and error classifier (§6 "Datastore"). Creating the
/// concrete streams, authenticating them, and encoding wire messages are all
/// out of scope here (§1 Non-goals); the Remote Store only needs a way to
/// obtain a stream handle and ask whether an error it observed is
/// retriable.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn create_watch_stream(&self) -> Result<Arc<dyn WatchStream>, RemoteStoreError>;
    async fn create_write_stream(&self) -> Result<Arc<dyn WriteStream>, RemoteStoreError>;
    fn is_permanent_write_error(&self, error: &RemoteStoreError) -> bool;
    fn is_aborted(&self, error: &RemoteStoreError) -> bool;
}
