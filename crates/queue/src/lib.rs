//! `queue` crate: the run hand-off channel between producers and workers.
//!
//! A [`RunQueue`] carries run identifiers in FIFO order. Delivery removes the
//! entry before the consumer starts processing it: if the consumer dies
//! mid-run the entry is gone and nothing re-delivers it.

pub mod error;
pub mod job;
pub mod memory;
pub mod postgres;

pub use error::QueueError;
pub use job::Job;
pub use memory::MemoryRunQueue;
pub use postgres::PgRunQueue;

use async_trait::async_trait;
use uuid::Uuid;

/// Durable FIFO of run ids.
#[async_trait]
pub trait RunQueue: Send + Sync {
    /// Append `run_id` to the tail. Never waits for a consumer.
    async fn enqueue(&self, run_id: Uuid) -> Result<(), QueueError>;

    /// Remove and return the head, or `None` when the queue is empty.
    async fn dequeue(&self) -> Result<Option<Uuid>, QueueError>;
}
