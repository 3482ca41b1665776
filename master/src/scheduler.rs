//! Coordinador de tareas.
//!
//! Todo el estado (fase, registro de tareas, pendientes) vive detrás de un
//! único `Mutex` que se toma sólo para contabilidad, nunca mientras se
//! ejecuta una tarea. Las tres operaciones quedan linealizadas entre sí.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use common::{Assignment, JobSnapshot, Phase, Task, TaskIndex, TaskStatus};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

/// Una tarea `Running` sin reporte por más de esto se vuelve a entregar.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("n_reduce debe ser al menos 1")]
    NoReduceBuckets,

    #[error("la tarea {index} no existe en la fase {phase:?} ({len} tareas)")]
    UnknownTask {
        phase: Phase,
        index: TaskIndex,
        len: usize,
    },

    #[error("el estado {0:?} no se puede reportar")]
    InvalidStatus(TaskStatus),
}

/// Qué pasó con un reporte aceptado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Recorded,
    /// La tarea ya estaba `Done`; no se descuenta de nuevo
    Duplicate,
    /// Reporte de una fase que ya no está activa
    StalePhase,
    /// Terminó el último map y se armó el registro de reduce
    PhaseAdvanced,
    /// Terminó el último reduce
    JobFinished,
}

struct Slot {
    task: Task,
    started: Option<Instant>,
}

struct Registry {
    phase: Phase,
    slots: Vec<Slot>,
    remaining: usize,
}

impl Registry {
    fn map_phase(files: &[String], n_reduce: usize) -> Self {
        let slots: Vec<Slot> = files
            .iter()
            .enumerate()
            .map(|(i, f)| Slot {
                task: Task::map(i, f.clone(), n_reduce, files.len()),
                started: None,
            })
            .collect();
        Self {
            phase: Phase::Map,
            remaining: slots.len(),
            slots,
        }
    }

    fn reduce_phase(n_reduce: usize, file_num: usize) -> Self {
        let slots: Vec<Slot> = (0..n_reduce)
            .map(|i| Slot {
                task: Task::reduce(i, n_reduce, file_num),
                started: None,
            })
            .collect();
        Self {
            phase: Phase::Reduce,
            remaining: slots.len(),
            slots,
        }
    }
}

pub struct Coordinator {
    registry: Mutex<Registry>,
    n_reduce: usize,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    pub fn new(
        files: Vec<String>,
        n_reduce: usize,
        timeout: Duration,
    ) -> Result<Self, SchedulerError> {
        Self::with_clock(files, n_reduce, timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        files: Vec<String>,
        n_reduce: usize,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        if n_reduce == 0 {
            return Err(SchedulerError::NoReduceBuckets);
        }

        // sin archivos no hay nada que mapear: directo a reduce
        let registry = if files.is_empty() {
            warn!("job sin archivos de entrada, pasando directo a reduce");
            Registry::reduce_phase(n_reduce, 0)
        } else {
            Registry::map_phase(&files, n_reduce)
        };

        info!(
            "coordinador listo: {} tareas map, n_reduce={}, timeout={:?}",
            files.len(),
            n_reduce,
            timeout
        );

        Ok(Self {
            registry: Mutex::new(registry),
            n_reduce,
            timeout,
            clock,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // el registro nunca queda a medio actualizar, se puede seguir usando
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recorre el registro en orden de índice y entrega la primera tarea que
    /// sea `Running` vencida, `Ready` o `Error`. Una tarea vencida se vuelve
    /// a sellar y se entrega sin cambiar su estado; el worker original no se
    /// entera y puede seguir.
    pub fn request_task(&self) -> Option<Assignment> {
        let now = self.clock.now();
        let mut reg = self.lock();
        let phase = reg.phase;

        for slot in reg.slots.iter_mut() {
            match slot.task.status {
                TaskStatus::Running => {
                    let expired = slot
                        .started
                        .map(|s| now.saturating_duration_since(s) > self.timeout)
                        .unwrap_or(true);
                    if !expired {
                        continue;
                    }
                    warn!(
                        "tarea {:?} #{} vencida ({}), reasignando",
                        phase, slot.task.index, slot.task.file_name
                    );
                }
                TaskStatus::Ready | TaskStatus::Error => {
                    slot.task.status = TaskStatus::Running;
                }
                TaskStatus::Done => continue,
            }

            slot.started = Some(now);
            slot.task.started_at = Some(self.clock.wall());
            debug!("asignando tarea {:?} #{}", phase, slot.task.index);
            return Some(Assignment {
                task: slot.task.clone(),
                phase,
            });
        }

        None
    }

    /// Registra el resultado de una tarea. El primer `Done` de cada tarea
    /// descuenta una pendiente; cuando no quedan maps se reemplaza el
    /// registro por el de reduce dentro de la misma sección crítica.
    pub fn report_task(
        &self,
        phase: Phase,
        index: TaskIndex,
        status: TaskStatus,
    ) -> Result<ReportOutcome, SchedulerError> {
        if !status.is_terminal_report() {
            return Err(SchedulerError::InvalidStatus(status));
        }

        let mut reg = self.lock();
        if phase != reg.phase {
            debug!(
                "ignorando reporte de {:?} #{} (fase activa {:?})",
                phase, index, reg.phase
            );
            return Ok(ReportOutcome::StalePhase);
        }

        let len = reg.slots.len();
        let slot = reg
            .slots
            .get_mut(index)
            .ok_or(SchedulerError::UnknownTask { phase, index, len })?;

        if slot.task.status == TaskStatus::Done {
            debug!("tarea {:?} #{} ya estaba terminada", phase, index);
            return Ok(ReportOutcome::Duplicate);
        }

        slot.task.status = status;
        if status == TaskStatus::Error {
            warn!("tarea {:?} #{} falló, queda para reasignar", phase, index);
            return Ok(ReportOutcome::Recorded);
        }

        match phase {
            Phase::Map => info!("map #{} ({}) terminado", index, slot.task.file_name),
            Phase::Reduce => info!("reduce #{} terminado", index),
        }

        reg.remaining -= 1;
        if reg.remaining > 0 {
            return Ok(ReportOutcome::Recorded);
        }

        match phase {
            Phase::Map => {
                let file_num = reg.slots.len();
                *reg = Registry::reduce_phase(self.n_reduce, file_num);
                info!(
                    "todos los map terminados ({}), pasando a reduce con {} tareas",
                    file_num, self.n_reduce
                );
                Ok(ReportOutcome::PhaseAdvanced)
            }
            Phase::Reduce => {
                info!("todos los reduce terminados, job completo");
                Ok(ReportOutcome::JobFinished)
            }
        }
    }

    /// `true` sólo cuando terminó la fase de reduce (el job entero).
    pub fn done(&self) -> bool {
        let reg = self.lock();
        reg.remaining == 0 && reg.phase == Phase::Reduce
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let reg = self.lock();
        JobSnapshot {
            phase: reg.phase,
            total_tasks: reg.slots.len(),
            remaining: reg.remaining,
            running: reg
                .slots
                .iter()
                .filter(|s| s.task.status == TaskStatus::Running)
                .count(),
            done: reg.remaining == 0 && reg.phase == Phase::Reduce,
        }
    }
}
