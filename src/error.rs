use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain response rows from a backing store.
#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("response store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to read responses from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed response row: {message}")]
    Schema { message: String },
}
