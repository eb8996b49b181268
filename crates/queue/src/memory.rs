//! In-process queue.
//!
//! Same contract as the Postgres queue minus durability. Used by tests and
//! by single-process setups that don't need the queue to survive a restart.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{QueueError, RunQueue};

#[derive(Debug, Default)]
pub struct MemoryRunQueue {
    entries: Mutex<VecDeque<Uuid>>,
}

impl MemoryRunQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl RunQueue for MemoryRunQueue {
    async fn enqueue(&self, run_id: Uuid) -> Result<(), QueueError> {
        self.entries.lock().await.push_back(run_id);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<Uuid>, QueueError> {
        Ok(self.entries.lock().await.pop_front())
    }
}
