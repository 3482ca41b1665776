mod client;
mod worker;

use std::{env, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use common::{app_by_name, MapReduceApp, Storage};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::client::HttpTaskSource;

const DEFAULT_BACKOFF_MS: u64 = 1000;

/// URL base del master.
/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn backoff() -> Duration {
    let ms = env::var("MR_BACKOFF_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_BACKOFF_MS);
    Duration::from_millis(ms)
}

fn storage_from_env() -> Storage {
    let root = env::var("MR_WORK_DIR").unwrap_or_else(|_| ".".to_string());
    let storage = Storage::new(root);
    match env::var("MR_SCRATCH_DIR") {
        Ok(dir) if !dir.is_empty() => storage.with_scratch_dir(dir),
        _ => storage,
    }
}

fn app_from_env() -> Result<Arc<dyn MapReduceApp>> {
    let name = env::var("MR_APP").unwrap_or_else(|_| "wordcount".to_string());
    app_by_name(&name)
        .map(Arc::from)
        .ok_or_else(|| anyhow!("aplicación desconocida: {}", name))
}

/// hostname + un sufijo corto para distinguir varios workers en la misma máquina
fn worker_id() -> String {
    let host = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", host, &suffix[..8])
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let app = app_from_env()?;
    let storage = storage_from_env();
    let base_url = master_base_url();
    let id = worker_id();

    info!(
        "worker {} contra {} (work_dir={})",
        id,
        base_url,
        storage.root().display()
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // sin señal no hay apagado limpio, pero el worker sigue
            warn!("no se pudo escuchar ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("ctrl-c recibido, terminando después de la tarea en curso");
        let _ = stop_tx.send(true);
    });

    let source = HttpTaskSource::new(base_url, id);
    worker::run(&source, app, storage, backoff(), stop_rx).await;

    Ok(())
}
