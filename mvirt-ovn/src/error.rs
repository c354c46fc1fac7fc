//! Errors surfaced by the object layer.

use thiserror::Error;

use crate::store::{StoreError, Table};

/// Root classification of an [`OvnError`], independent of context layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    InvalidArgument,
    Transaction,
    Store,
}

/// Errors returned by [`crate::OvnClient`] operations.
#[derive(Debug, Error)]
pub enum OvnError {
    /// A required lookup matched nothing.
    #[error("not found {} {name:?}", kind.kind())]
    NotFound { kind: Table, name: String },

    /// A lookup matched more than one row. Never resolved automatically.
    #[error("more than one {} with same name {name:?} ({count} matches)", kind.kind())]
    Ambiguous {
        kind: Table,
        name: String,
        count: usize,
    },

    /// The caller passed something the operation cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store rejected or failed the transaction. Nothing was applied.
    #[error("transaction {label} failed: {source}")]
    Transaction {
        label: String,
        #[source]
        source: StoreError,
    },

    /// Cache read or row decode failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Another error annotated with the operation and target it belongs to.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<OvnError>,
    },
}

impl OvnError {
    /// Wrap this error with a description of what was being attempted.
    pub fn context(self, context: impl Into<String>) -> Self {
        OvnError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classification of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OvnError::NotFound { .. } => ErrorKind::NotFound,
            OvnError::Ambiguous { .. } => ErrorKind::Ambiguous,
            OvnError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            OvnError::Transaction { .. } => ErrorKind::Transaction,
            OvnError::Store(_) => ErrorKind::Store,
            OvnError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_ambiguous(&self) -> bool {
        self.kind() == ErrorKind::Ambiguous
    }
}

/// Result type for object layer operations.
pub type Result<T> = std::result::Result<T, OvnError>;

/// Attach context to the error side of a [`Result`].
pub(crate) trait ResultExt<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context_with<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
