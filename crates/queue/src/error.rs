//! Queue error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing transport or storage could not be reached. Transient.
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    /// An entry was removed from the queue but its payload did not decode.
    #[error("malformed queue entry: {0}")]
    Malformed(String),
}

impl From<db::DbError> for QueueError {
    fn from(err: db::DbError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
