//! `flowrun` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: start the API server.
//! - `worker`: start queue workers.
//! - `migrate`: run pending database migrations.
//! - `validate`: validate a flow definition JSON file.

mod config;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{DatabaseArgs, WorkerArgs};
use engine::{Dispatcher, NodeExecutor, PgStore, Worker};
use nodes::ReqwestCaller;
use queue::PgRunQueue;

#[derive(Parser)]
#[command(
    name = "flowrun",
    about = "Queue-backed runner for linear flows",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:4000")]
        bind: String,
        /// Don't apply migrations on startup.
        #[arg(long)]
        skip_migrations: bool,
        #[command(flatten)]
        db: DatabaseArgs,
    },
    /// Start background workers that process queued runs.
    Worker {
        #[command(flatten)]
        db: DatabaseArgs,
        #[command(flatten)]
        worker: WorkerArgs,
    },
    /// Run pending database migrations.
    Migrate {
        #[command(flatten)]
        db: DatabaseArgs,
    },
    /// Validate a flow definition JSON file.
    Validate {
        /// A JSON array of nodes, or an object with a `nodes` array.
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, skip_migrations, db } => {
            let pool = db::pool::create_pool(&db.pool_settings())
                .await
                .context("failed to connect to database")?;
            if !skip_migrations {
                db::pool::run_migrations(&pool).await.context("migration failed")?;
            }

            let store = Arc::new(PgStore::new(pool.clone()));
            let queue = Arc::new(PgRunQueue::new(pool));
            let state = api::AppState {
                flows: store.clone(),
                runs: store.clone(),
                dispatcher: Dispatcher::new(store.clone(), store, queue),
            };

            let shutdown = shutdown_token();
            api::serve(&bind, state, async move { shutdown.cancelled().await })
                .await
                .context("api server failed")?;
        }
        Command::Worker { db, worker } => {
            let pool = db::pool::create_pool(&db.pool_settings())
                .await
                .context("failed to connect to database")?;
            let http = ReqwestCaller::new(&worker.http_config()).context("failed to build http client")?;

            let store = Arc::new(PgStore::new(pool.clone()));
            let template = Worker::new(
                store.clone(),
                store,
                Arc::new(PgRunQueue::new(pool)),
                NodeExecutor::new(Arc::new(http)),
                worker.worker_config(),
            );

            let shutdown = shutdown_token();
            let concurrency = worker.concurrency.max(1);
            info!(concurrency, "starting workers");

            let handles: Vec<_> = (0..concurrency)
                .map(|_| {
                    let worker = template.clone();
                    let token = shutdown.clone();
                    tokio::spawn(async move { worker.run(token).await })
                })
                .collect();
            for handle in handles {
                handle.await.context("worker task panicked")?;
            }
        }
        Command::Migrate { db } => {
            let pool = db::pool::create_pool(&db.pool_settings())
                .await
                .context("failed to connect to database")?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("migrations applied successfully");
        }
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read file {}", path.display()))?;
            let mut raw: serde_json::Value =
                serde_json::from_str(&content).context("invalid JSON")?;
            if let Some(nodes) = raw.get_mut("nodes") {
                raw = nodes.take();
            }

            match engine::parse_nodes(raw) {
                Ok(nodes) => {
                    let order: Vec<String> = nodes
                        .iter()
                        .map(|n| format!("{}:{}", n.id, n.kind.type_name()))
                        .collect();
                    println!("flow is valid. execution order: {}", order.join(" -> "));
                }
                Err(e) => {
                    eprintln!("validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// A token that is cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), token.clone()));
    token
}

/// Cancel `token` once `signal` fires. If the signal handler cannot be
/// installed the token is left alone and the process runs until killed.
async fn cancel_on_signal(signal: impl Future<Output = std::io::Result<()>>, token: CancellationToken) {
    match signal.await {
        Ok(()) => {
            info!("shutdown requested");
            token.cancel();
        }
        Err(e) => error!(error = %e, "cannot listen for ctrl-c; graceful shutdown disabled"),
    }
}
