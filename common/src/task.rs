use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Índice de una tarea dentro de su fase: rango denso [0, N).
pub type TaskIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Map,
    Reduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Ready,
    Running,
    Done,
    Error,
}

impl TaskStatus {
    /// Sólo `Done` y `Error` pueden llegar en un reporte de un worker.
    pub fn is_terminal_report(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub index: TaskIndex,
    pub status: TaskStatus,

    /// Archivo de entrada (sólo map; vacío en reduce)
    pub file_name: String,

    /// Cantidad total de buckets de reduce, fija para todo el job
    pub n_reduce: usize,

    /// Cantidad de tareas map que alimentan a cada reduce
    pub file_num: usize,

    /// Momento de la última asignación (informativo para el worker)
    pub started_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn map(index: TaskIndex, file_name: impl Into<String>, n_reduce: usize, file_num: usize) -> Self {
        Self {
            index,
            status: TaskStatus::Ready,
            file_name: file_name.into(),
            n_reduce,
            file_num,
            started_at: None,
        }
    }

    pub fn reduce(index: TaskIndex, n_reduce: usize, file_num: usize) -> Self {
        Self {
            index,
            status: TaskStatus::Ready,
            file_name: String::new(),
            n_reduce,
            file_num,
            started_at: None,
        }
    }
}

/// Lo que recibe un worker cuando hay algo para hacer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub task: Task,
    pub phase: Phase,
}
