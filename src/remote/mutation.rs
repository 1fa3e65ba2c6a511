use crate::model::{DocumentKey, SnapshotVersion};
use crate::value::MapValue;

/// A single write against one document. The full field-mask/transform
/// machinery of a production client is tied to wire encoding, which is out
/// of scope here (§1 Non-goals: "encoding of mutations on the wire"); this
/// is the minimal shape the write pipeline needs to move batches around.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Set { key: DocumentKey, fields: MapValue },
    Update { key: DocumentKey, fields: MapValue },
    Delete { key: DocumentKey },
}

impl Mutation {
    pub fn key(&self) -> &DocumentKey {
        match self {
            Mutation::Set { key, .. } => key,
            Mutation::Update { key, .. } => key,
            Mutation::Delete { key } => key,
        }
    }
}

pub type BatchId = i32;

/// Sentinel for `LastBatchSeen` before any batch has been handed to the
/// write pipeline (§3 "initial value is the sentinel `UNKNOWN`"). Batch ids
/// handed out by the local store are always positive.
pub const UNKNOWN_BATCH_ID: BatchId = -1;

/// An atomic group of writes with a local `batch_id` (GLOSSARY).
#[derive(Clone, Debug, PartialEq)]
pub struct MutationBatch {
    pub batch_id: BatchId,
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new(batch_id: BatchId, mutations: Vec<Mutation>) -> Self {
        Self { batch_id, mutations }
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// The per-mutation outcome reported by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationResult {
    pub update_time: Option<SnapshotVersion>,
}

/// The result of a successfully-acked batch (§4.5 "Mutation-result"),
/// including the stream token in effect when the ack arrived.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationBatchResult {
    pub batch: MutationBatch,
    pub commit_version: SnapshotVersion,
    pub mutation_results: Vec<MutationResult>,
    pub stream_token: Vec<u8>,
}

impl MutationBatchResult {
    pub fn new(
        batch: MutationBatch,
        commit_version: SnapshotVersion,
        mutation_results: Vec<MutationResult>,
        stream_token: Vec<u8>,
    ) -> Self {
        Self {
            batch,
            commit_version,
            mutation_results,
            stream_token,
        }
    }
}
