//! Postgres-backed queue over the `run_queue` table.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use db::DbPool;
use db::repository::queue as queue_repo;

use crate::{Job, QueueError, RunQueue};

#[derive(Debug, Clone)]
pub struct PgRunQueue {
    pool: DbPool,
}

impl PgRunQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Entries currently waiting to be picked up.
    pub async fn len(&self) -> Result<i64, QueueError> {
        Ok(queue_repo::len(&self.pool).await?)
    }
}

#[async_trait]
impl RunQueue for PgRunQueue {
    async fn enqueue(&self, run_id: Uuid) -> Result<(), QueueError> {
        let entry = queue_repo::push(&self.pool, Job { run_id }.to_value()).await?;
        debug!(%run_id, entry_id = entry.id, "run enqueued");
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Uuid>, QueueError> {
        let Some(entry) = queue_repo::pop(&self.pool).await? else {
            return Ok(None);
        };
        let job = Job::from_value(entry.payload)?;
        debug!(run_id = %job.run_id, entry_id = entry.id, "run dequeued");
        Ok(Some(job.run_id))
    }
}
