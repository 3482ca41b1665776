mod clock;
mod config;
mod handlers;
mod scheduler;
mod state;

#[cfg(test)]
mod tests;

use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{expand_inputs, Args};
use crate::scheduler::Coordinator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("master=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let files = expand_inputs(&args.inputs)?;

    let coordinator = Coordinator::new(
        files,
        args.n_reduce,
        Duration::from_millis(args.task_timeout_ms),
    )?;
    let state = AppState::new(coordinator);

    // router HTTP
    let app = handlers::build_router(state.clone());

    let listener = TcpListener::bind(&args.listen).await?;
    info!("master escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            state,
            Duration::from_millis(args.done_poll_ms),
            Duration::from_millis(args.linger_ms),
        ))
        .await?;

    info!("master detenido");
    Ok(())
}

async fn wait_until_done(state: AppState, poll: Duration) {
    while !state.coordinator.done() {
        sleep(poll).await;
    }
}

/// Se resuelve cuando el job terminó (más un margen para que los workers
/// alcancen a reportar) o con Ctrl-C.
async fn shutdown_signal(state: AppState, poll: Duration, linger: Duration) {
    tokio::select! {
        _ = wait_until_done(state, poll) => {
            info!("job terminado, cerrando en {:?}", linger);
            sleep(linger).await;
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("no se pudo escuchar ctrl-c: {}", e);
            }
            warn!("ctrl-c recibido, cerrando master");
        }
    }
}
