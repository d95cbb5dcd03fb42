//! Storage error type shared by every backend.

use derive_getters::Getters;
use derive_more::{Display, Error};
use diesel::result::DatabaseErrorKind;
use tracing::{instrument, warn};

/// What went wrong underneath a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StoreErrorKind {
    /// Connection, lock or migration failure.
    #[display("unavailable")]
    Unavailable,
    /// A uniqueness rule rejected the write.
    #[display("conflict")]
    Conflict,
    /// A row the caller relied on is gone.
    #[display("missing")]
    Missing,
    /// A stored row no longer satisfies the game rules.
    #[display("corrupt")]
    Corrupt,
    /// Any other query failure.
    #[display("query")]
    Query,
}

/// Infrastructure failure, tagged with a kind and the raising location.
///
/// Backends raise this for anything that is not a domain outcome.
#[derive(Debug, Clone, Display, Error, Getters)]
#[display("Storage error ({}): {} at {}:{}", kind, message, file, line)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
    line: u32,
    #[getter(skip)]
    file: &'static str,
}

impl StoreError {
    /// Get field `file` from instance of `StoreError`.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Creates a storage error of `kind` located at the caller.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        warn!(%kind, message = %message, file = loc.file(), line = loc.line(), "Storage failure");
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Backend cannot be reached or locked.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    /// A unique column already holds the value.
    #[track_caller]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Conflict, message)
    }

    /// An expected row does not exist.
    #[track_caller]
    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Missing, message)
    }

    /// A stored row cannot be interpreted.
    #[track_caller]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Corrupt, message)
    }

    /// True when a uniqueness rule rejected the write.
    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        let kind = match &err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreErrorKind::Conflict
            }
            diesel::result::Error::NotFound => StoreErrorKind::Missing,
            _ => StoreErrorKind::Query,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::unavailable(err.to_string())
    }
}
