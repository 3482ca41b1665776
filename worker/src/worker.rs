use std::sync::Arc;
use std::time::Duration;

use common::{engine, Assignment, MapReduceApp, Phase, Storage, TaskSource, TaskStatus};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Cuántas tareas terminó este worker, por resultado.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub done: u64,
    pub failed: u64,
}

/// Ejecuta la tarea fuera del runtime async. Un panic de la función de
/// usuario cuenta como `Error`.
async fn execute(
    app: Arc<dyn MapReduceApp>,
    storage: Storage,
    assignment: Assignment,
) -> TaskStatus {
    let phase = assignment.phase;
    let index = assignment.task.index;

    let handle =
        tokio::task::spawn_blocking(move || engine::execute(app.as_ref(), &storage, &assignment));

    match handle.await {
        Ok(Ok(())) => {
            info!("terminé {:?} #{} correctamente", phase, index);
            TaskStatus::Done
        }
        Ok(Err(e)) => {
            warn!("error procesando {:?} #{}: {}", phase, index, e);
            TaskStatus::Error
        }
        Err(e) => {
            warn!("panic o join error en {:?} #{}: {:?}", phase, index, e);
            TaskStatus::Error
        }
    }
}

/// Duerme `backoff` o hasta que llegue la señal de apagado.
/// Devuelve `true` si hay que parar.
async fn back_off(backoff: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = sleep(backoff) => *shutdown.borrow(),
        res = shutdown.changed() => res.is_err() || *shutdown.borrow(),
    }
}

/// Loop principal del worker:
/// - pide una tarea
/// - si no hay (o el master no responde), espera `backoff` y reintenta
/// - si hay, la ejecuta y reporta Done/Error
///
/// No termina solo: el job puede estar completo y el worker seguir
/// preguntando. Se corta con la señal `shutdown`.
pub async fn run<S>(
    source: &S,
    app: Arc<dyn MapReduceApp>,
    storage: Storage,
    backoff: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerStats
where
    S: TaskSource + ?Sized,
{
    let mut stats = WorkerStats::default();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let assignment = match source.request_task().await {
            Ok(Some(a)) => a,
            Ok(None) => {
                debug!("no hay tareas, esperando {:?}", backoff);
                if back_off(backoff, &mut shutdown).await {
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!("no se pudo pedir tarea al master: {:#}", e);
                if back_off(backoff, &mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        let phase = assignment.phase;
        let index = assignment.task.index;
        match phase {
            Phase::Map => info!(
                "tengo map #{} (input={}, n_reduce={})",
                index, assignment.task.file_name, assignment.task.n_reduce
            ),
            Phase::Reduce => info!(
                "tengo reduce #{} ({} intermedios)",
                index, assignment.task.file_num
            ),
        }

        let status = execute(app.clone(), storage.clone(), assignment).await;
        match status {
            TaskStatus::Done => stats.done += 1,
            _ => stats.failed += 1,
        }

        if let Err(e) = source.report_task(phase, index, status).await {
            // el master reasignará la tarea cuando venza
            warn!("no se pudo reportar {:?} #{}: {:#}", phase, index, e);
        }
    }

    info!(
        "worker detenido ({} tareas ok, {} con error)",
        stats.done, stats.failed
    );
    stats
}
