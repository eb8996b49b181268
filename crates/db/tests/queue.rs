//! `run_queue` table tests. They need a reachable Postgres in
//! `DATABASE_URL` and are skipped without one.
//!
//! Everything that touches the shared table lives in one test so parallel
//! tests in this binary never steal each other's rows.

use std::collections::HashSet;

use serde_json::json;

use db::pool::{create_pool, run_migrations, PoolSettings};
use db::repository::queue as queue_repo;
use db::DbPool;

async fn test_pool() -> Option<DbPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping postgres test");
        return None;
    };
    let pool = create_pool(&PoolSettings::new(url)).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");
    Some(pool)
}

async fn drain(pool: &DbPool) {
    while queue_repo::pop(pool).await.unwrap().is_some() {}
}

#[tokio::test]
async fn queue_table_is_fifo_and_delivers_each_entry_once() {
    let Some(pool) = test_pool().await else { return };
    drain(&pool).await;

    // Empty queue.
    assert!(queue_repo::pop(&pool).await.unwrap().is_none());
    assert_eq!(queue_repo::len(&pool).await.unwrap(), 0);

    // FIFO, and each pop removes its row.
    for n in 0..3 {
        queue_repo::push(&pool, json!({ "n": n })).await.unwrap();
    }
    assert_eq!(queue_repo::len(&pool).await.unwrap(), 3);
    for n in 0..3 {
        let entry = queue_repo::pop(&pool).await.unwrap().expect("entry");
        assert_eq!(entry.payload, json!({ "n": n }));
    }
    assert!(queue_repo::pop(&pool).await.unwrap().is_none());

    // Concurrent consumers split the entries without overlap.
    for n in 0..40 {
        queue_repo::push(&pool, json!({ "n": n })).await.unwrap();
    }
    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(entry) = queue_repo::pop(&pool).await.unwrap() {
                    seen.push(entry.payload["n"].as_i64().unwrap());
                }
                seen
            })
        })
        .collect();

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.await.unwrap());
    }
    assert_eq!(all.len(), 40);
    assert_eq!(all.iter().collect::<HashSet<_>>().len(), 40);
    assert_eq!(queue_repo::len(&pool).await.unwrap(), 0);
}
