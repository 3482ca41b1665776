use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::task::{Assignment, Phase, TaskIndex, TaskStatus};

pub type WorkerId = String;

/* --------- Mensajes worker -> master --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentRequest {
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentResponse {
    /// `None` = no hay nada asignable por ahora (no significa que el job terminó)
    pub assignment: Option<Assignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTaskRequest {
    pub worker_id: WorkerId,
    /// Fase en la que se ejecutó la tarea; reportes de otra fase se ignoran
    pub phase: Phase,
    pub index: TaskIndex,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTaskResponse {
    pub ok: bool,
}

/* --------- Consultas del driver externo --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneResponse {
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub phase: Phase,
    pub total_tasks: usize,
    pub remaining: usize,
    pub running: usize,
    pub done: bool,
}

/// Frontera request/reply entre worker y coordinador. Puede ser HTTP o un
/// canal en memoria en los tests.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn request_task(&self) -> anyhow::Result<Option<Assignment>>;

    async fn report_task(
        &self,
        phase: Phase,
        index: TaskIndex,
        status: TaskStatus,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn respuesta_sin_tarea_serializa_assignment_como_null() {
        let json = serde_json::to_value(TaskAssignmentResponse { assignment: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "assignment": null }));
    }

    #[test]
    fn report_request_usa_nombres_del_protocolo() {
        let req = ReportTaskRequest {
            worker_id: "w1".to_string(),
            phase: Phase::Map,
            index: 2,
            status: TaskStatus::Done,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "worker_id": "w1",
                "phase": "MAP",
                "index": 2,
                "status": "DONE",
            })
        );
    }

    #[test]
    fn respuesta_con_tarea_se_parsea_desde_json() {
        let raw = r#"{
            "assignment": {
                "phase": "REDUCE",
                "task": {
                    "index": 1, "status": "RUNNING", "file_name": "",
                    "n_reduce": 2, "file_num": 3, "started_at": null
                }
            }
        }"#;
        let resp: TaskAssignmentResponse = serde_json::from_str(raw).unwrap();
        let a = resp.assignment.unwrap();
        assert_eq!(a.phase, Phase::Reduce);
        assert_eq!(a.task, {
            let mut t = Task::reduce(1, 2, 3);
            t.status = TaskStatus::Running;
            t
        });
    }
}
