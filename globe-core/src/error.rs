use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories surfaced to callers of the resolvers.
///
/// Upstream failures (timeouts, bad status codes, malformed payloads) never
/// appear here directly; they are absorbed by the fallback chains and only
/// show up as [`ResolveError::ServiceUnavailable`] or
/// [`ResolveError::NoResults`] once every tier is exhausted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NoResults(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InputValidationError,
    NoResultsError,
    ServiceUnavailableError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputValidationError => "input-validation-error",
            ErrorKind::NoResultsError => "no-results-error",
            ErrorKind::ServiceUnavailableError => "service-unavailable-error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of an error: `{"error": "...", "kind": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub kind: ErrorKind,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidInput(_) => ErrorKind::InputValidationError,
            ResolveError::NoResults(_) => ErrorKind::NoResultsError,
            ResolveError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailableError,
        }
    }

    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord { error: self.to_string(), kind: self.kind() }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_kebab_tag() {
        let err = ResolveError::NoResults("No results".into());
        let json = serde_json::to_value(err.to_record()).unwrap();

        assert_eq!(json["error"], "No results");
        assert_eq!(json["kind"], "no-results-error");
    }

    #[test]
    fn kind_matches_as_str() {
        for kind in [
            ErrorKind::InputValidationError,
            ErrorKind::NoResultsError,
            ErrorKind::ServiceUnavailableError,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }
}
