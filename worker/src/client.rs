use anyhow::Result;
use async_trait::async_trait;
use common::{
    Assignment, Phase, ReportTaskRequest, ReportTaskResponse, TaskAssignmentRequest,
    TaskAssignmentResponse, TaskIndex, TaskSource, TaskStatus, WorkerId,
};
use reqwest::Client;

/// `TaskSource` que habla con el master por HTTP/JSON.
pub struct HttpTaskSource {
    client: Client,
    base_url: String,
    worker_id: WorkerId,
}

impl HttpTaskSource {
    pub fn new(base_url: impl Into<String>, worker_id: WorkerId) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            worker_id,
        }
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn request_task(&self) -> Result<Option<Assignment>> {
        let url = format!("{}/api/v1/tasks/next", self.base_url);
        let resp: TaskAssignmentResponse = self
            .client
            .post(&url)
            .json(&TaskAssignmentRequest {
                worker_id: self.worker_id.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.assignment)
    }

    async fn report_task(&self, phase: Phase, index: TaskIndex, status: TaskStatus) -> Result<()> {
        let url = format!("{}/api/v1/tasks/report", self.base_url);
        let _: ReportTaskResponse = self
            .client
            .post(&url)
            .json(&ReportTaskRequest {
                worker_id: self.worker_id.clone(),
                phase,
                index,
                status,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(())
    }
}
