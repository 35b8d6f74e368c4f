//! Domain errors for the reference-resolution cache.

use thiserror::Error;

/// Coarse classification of a [`DomainError`], used by callers that need
/// to translate failures (for example into HTTP status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The entity does not exist in the backing store.
    NotFound,
    /// I/O or store failure; the next caller may retry.
    Transient,
    /// The reference could not be parsed into a scope and a leaf.
    InvalidReference,
    /// Serialization, bus or other internal failure.
    Internal,
}

/// Domain-level errors that can occur while resolving references.
///
/// The type is `Clone` because a single loader result is handed to every
/// caller coalesced behind the same in-flight load.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("PubSub error: {0}")]
    PubSub(String),

    #[error("Load aborted: {0}")]
    LoadAborted(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DomainError>,
    },
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with a description of the lookup that failed.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through any context wrapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store(_) | Self::LoadAborted(_) => ErrorKind::Transient,
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::Serialization(_) | Self::PubSub(_) => ErrorKind::Internal,
            Self::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if retrying the same lookup later may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// Extension for attaching lookup context to a `DomainResult`.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> DomainResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for DomainResult<T> {
    fn with_context<F, S>(self, f: F) -> DomainResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
