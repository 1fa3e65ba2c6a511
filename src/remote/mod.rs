pub mod aggregator;
pub mod datastore;
pub mod local_store;
pub mod mutation;
pub mod online_state;
pub mod remote_event;
pub mod remote_store;
pub mod streams;
pub mod sync_engine;
pub mod target;
pub mod watch_change;

pub use aggregator::{aggregate, AggregationResult};
pub use datastore::Datastore;
pub use local_store::LocalStore;
pub use mutation::{BatchId, Mutation, MutationBatch, MutationBatchResult, MutationResult, UNKNOWN_BATCH_ID};
pub use online_state::{OnlineState, OnlineStateDelegate, OnlineStateTracker};
pub use remote_event::{RemoteEvent, TargetChange};
pub use remote_store::RemoteStore;
pub use streams::{WatchStream, WatchStreamDelegate, WriteStream, WriteStreamDelegate};
pub use sync_engine::SyncEngine;
pub use target::{QueryData, QueryPurpose, QueryTarget, ResumeToken, TargetId};
pub use watch_change::{
    ExistenceFilter, TargetChangeState, WatchChange, WatchDocument, WatchDocumentChange,
    WatchDocumentDelete, WatchDocumentRemove, WatchTargetChange,
};
