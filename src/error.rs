use std::fmt;

/// Stable error classification surfaced across the Remote Store's public API.
///
/// Internal invariant violations (duplicate listen, unlisten of an unknown
/// target, double `enable_network`) are programmer errors per the error
/// handling design and are raised via `assert!`/`debug_assert!` instead of
/// this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteStoreErrorCode {
    /// The watch or write stream could not be created by the datastore.
    StreamUnavailable,
    /// A transport error was reported by a stream and classified as permanent.
    PermanentTransport,
    /// The server removed a target with a cause; surfaced, not retried.
    TargetRemoved,
    /// A collaborator (local store, sync engine) returned an error.
    Collaborator,
}

impl RemoteStoreErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreamUnavailable => "stream-unavailable",
            Self::PermanentTransport => "permanent-transport",
            Self::TargetRemoved => "target-removed",
            Self::Collaborator => "collaborator",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteStoreError {
    code: RemoteStoreErrorCode,
    message: String,
}

impl RemoteStoreError {
    pub fn new(code: RemoteStoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> RemoteStoreErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for RemoteStoreError {}

pub type RemoteStoreResult<T> = Result<T, RemoteStoreError>;

pub fn stream_unavailable(message: impl Into<String>) -> RemoteStoreError {
    RemoteStoreError::new(RemoteStoreErrorCode::StreamUnavailable, message)
}

pub fn permanent_transport(message: impl Into<String>) -> RemoteStoreError {
    RemoteStoreError::new(RemoteStoreErrorCode::PermanentTransport, message)
}

pub fn target_removed(message: impl Into<String>) -> RemoteStoreError {
    RemoteStoreError::new(RemoteStoreErrorCode::TargetRemoved, message)
}

pub fn collaborator(message: impl Into<String>) -> RemoteStoreError {
    RemoteStoreError::new(RemoteStoreErrorCode::Collaborator, message)
}
