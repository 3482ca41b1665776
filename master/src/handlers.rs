use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{
    DoneResponse, JobSnapshot, ReportTaskRequest, ReportTaskResponse, TaskAssignmentRequest,
    TaskAssignmentResponse,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::scheduler::SchedulerError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks/next", post(assign_task))
        .route("/api/v1/tasks/report", post(report_task))
        .route("/api/v1/job", get(get_job))
        .route("/api/v1/job/done", get(job_done))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// RequestTask: la primera tarea asignable, o null si no hay nada por ahora
async fn assign_task(
    State(state): State<AppState>,
    Json(req): Json<TaskAssignmentRequest>,
) -> Json<TaskAssignmentResponse> {
    let assignment = state.coordinator.request_task();

    match &assignment {
        Some(a) => info!(
            "asignando {:?} #{} al worker {}",
            a.phase, a.task.index, req.worker_id
        ),
        None => debug!("worker {} pidió tarea pero no hay", req.worker_id),
    }

    Json(TaskAssignmentResponse { assignment })
}

// ReportTask: Done o Error de una tarea
async fn report_task(
    State(state): State<AppState>,
    Json(req): Json<ReportTaskRequest>,
) -> Result<Json<ReportTaskResponse>, StatusCode> {
    match state
        .coordinator
        .report_task(req.phase, req.index, req.status)
    {
        Ok(outcome) => {
            debug!(
                "worker {} reportó {:?} #{} = {:?} -> {:?}",
                req.worker_id, req.phase, req.index, req.status, outcome
            );
            Ok(Json(ReportTaskResponse { ok: true }))
        }
        Err(e) => {
            warn!("reporte rechazado del worker {}: {}", req.worker_id, e);
            Err(match e {
                SchedulerError::UnknownTask { .. } => StatusCode::NOT_FOUND,
                SchedulerError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                SchedulerError::NoReduceBuckets => StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }
}

async fn job_done(State(state): State<AppState>) -> Json<DoneResponse> {
    Json(DoneResponse {
        done: state.coordinator.done(),
    })
}

async fn get_job(State(state): State<AppState>) -> Json<JobSnapshot> {
    Json(state.coordinator.snapshot())
}
