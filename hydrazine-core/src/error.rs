use thiserror::Error;

use crate::key::ResourceKind;
use crate::link::LinkKind;

/// Error type for building, caching and resolving resources.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognized resource kind: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnrecognizedResourceKind(Option<String>),

    #[error("space mismatch: client is configured for {expected}, document belongs to {found}")]
    SpaceMismatch { expected: String, found: String },

    #[error("cannot resolve a link to a {0}")]
    InvalidLinkType(LinkKind),

    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("misconfigured durable cache: {0}")]
    MisconfiguredCache(String),

    #[error("cannot map {kind} {id}: {reason}")]
    Mapping {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    #[error("unknown locale: {0}")]
    UnknownLocale(String),

    #[error("expected {expected}, got {found}")]
    UnexpectedKind { expected: &'static str, found: String },

    #[error("the owning client has been dropped")]
    ClientDropped,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn mapping(kind: ResourceKind, id: &str, reason: impl Into<String>) -> Self {
        Error::Mapping {
            kind,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a page can replace the failing item with an unresolved marker
    /// instead of failing as a whole.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedResourceKind(_) | Error::Mapping { .. } | Error::NotFound { .. }
        )
    }
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no resource at {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TransportError::Failed(err.into())
    }
}

/// Failure reported by a [`DurableCache`](crate::DurableCache) implementation.
#[derive(Debug, Error)]
#[error("durable cache error: {0}")]
pub struct CacheError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl CacheError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        CacheError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_recoverable_errors() {
        assert!(Error::UnrecognizedResourceKind(Some("Widget".into())).is_recoverable());
        assert!(Error::mapping(ResourceKind::Entry, "x", "bad fields").is_recoverable());
        assert!(
            !Error::SpaceMismatch {
                expected: "a".into(),
                found: "b".into()
            }
            .is_recoverable()
        );
        assert!(!Error::Transport(TransportError::failed("timeout")).is_recoverable());
    }

    #[test]
    fn missing_kind_display() {
        let err = Error::UnrecognizedResourceKind(None);
        assert_eq!(err.to_string(), "unrecognized resource kind: <missing>");
    }
}
