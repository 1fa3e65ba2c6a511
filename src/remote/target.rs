use crate::model::{DocumentKey, ResourcePath, SnapshotVersion, Timestamp};

/// Opaque 32-bit integer assigned by the sync engine; uniquely identifies a
/// listen (§3).
pub type TargetId = i32;

/// The two shapes of query this core needs to distinguish for existence-filter
/// reconciliation (§4.4). The full query DSL/evaluator is out of scope (§1
/// Non-goals: "query evaluation"); this is the minimal cut that tells a
/// single-document listen apart from a collection listen.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    Document(DocumentKey),
    Collection { parent: ResourcePath, collection_id: String },
}

impl QueryTarget {
    pub fn is_document_query(&self) -> bool {
        matches!(self, QueryTarget::Document(_))
    }
}

/// Why a target is (or was) being listened to (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryPurpose {
    Listen,
    ExistenceFilterMismatch,
    LimboResolution,
}

/// An opaque resume token issued by the server (GLOSSARY).
pub type ResumeToken = Vec<u8>;

/// Record of `{query, target_id, purpose, snapshot_version, resume_token}`
/// (§3). Owned by the Remote Store while the target is active.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryData {
    query: QueryTarget,
    target_id: TargetId,
    purpose: QueryPurpose,
    snapshot_version: SnapshotVersion,
    resume_token: ResumeToken,
}

impl QueryData {
    pub fn new(query: QueryTarget, target_id: TargetId, purpose: QueryPurpose) -> Self {
        Self {
            query,
            target_id,
            purpose,
            snapshot_version: Timestamp::NONE,
            resume_token: Vec::new(),
        }
    }

    pub fn query(&self) -> &QueryTarget {
        &self.query
    }

    pub fn target_id(&self) -> TargetId {
        self.target_id
    }

    pub fn purpose(&self) -> QueryPurpose {
        self.purpose
    }

    pub fn snapshot_version(&self) -> SnapshotVersion {
        self.snapshot_version
    }

    pub fn resume_token(&self) -> &ResumeToken {
        &self.resume_token
    }

    /// Replaces the snapshot version / resume token (§4.4 final paragraph),
    /// keeping the same target, query and purpose.
    pub fn with_snapshot(&self, version: SnapshotVersion, token: ResumeToken) -> Self {
        Self {
            query: self.query.clone(),
            target_id: self.target_id,
            purpose: self.purpose,
            snapshot_version: version,
            resume_token: token,
        }
    }

    /// Replaces the purpose, keeping everything else (used to build the
    /// mismatch-purpose re-listen in §4.4 step 3).
    pub fn with_purpose(&self, purpose: QueryPurpose) -> Self {
        Self {
            query: self.query.clone(),
            target_id: self.target_id,
            purpose,
            snapshot_version: self.snapshot_version,
            resume_token: self.resume_token.clone(),
        }
    }

    /// A fresh `QueryData` for the same target/query with no resume token,
    /// forcing a full re-listen (§4.4 step 2).
    pub fn reset(&self) -> Self {
        Self {
            query: self.query.clone(),
            target_id: self.target_id,
            purpose: QueryPurpose::Listen,
            snapshot_version: Timestamp::NONE,
            resume_token: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_snapshot_replaces_version_and_token() {
        let data = QueryData::new(
            QueryTarget::Document(DocumentKey::from_string("rooms/eros")),
            1,
            QueryPurpose::Listen,
        );
        let updated = data.with_snapshot(Timestamp::new(5, 0), b"token".to_vec());
        assert_eq!(updated.snapshot_version(), Timestamp::new(5, 0));
        assert_eq!(updated.resume_token(), b"token");
        assert_eq!(data.resume_token(), &Vec::<u8>::new());
    }

    #[test]
    fn reset_clears_resume_token_and_purpose() {
        let data = QueryData::new(
            QueryTarget::Collection { parent: ResourcePath::root(), collection_id: "rooms".into() },
            2,
            QueryPurpose::ExistenceFilterMismatch,
        )
        .with_snapshot(Timestamp::new(1, 0), b"stale".to_vec());
        let reset = data.reset();
        assert!(reset.resume_token().is_empty());
        assert_eq!(reset.purpose(), QueryPurpose::Listen);
    }
}
