//! Error types for the back-office core.
//!
//! Every operation surfaces its failure synchronously to the caller; there
//! is no retry queue and nothing propagates to a global handler. Corrupt
//! persisted data is deliberately NOT an error: the store fails closed and
//! reads the slot as empty (see `store`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any mutation took place.
    #[error("{0}")]
    Validation(String),

    /// An existence guard failed (unknown agent, product, record).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stock adjustment would drive the level negative and the caller
    /// has not acknowledged it. Negative stock is a permitted, recorded
    /// state once acknowledged.
    #[error("stock for {product} would drop to {would_be}; re-submit with acknowledgement to proceed")]
    NegativeStock { product: String, would_be: i64 },

    /// Underlying SQLite or serialization failure.
    #[error("storage: {0}")]
    Storage(String),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
