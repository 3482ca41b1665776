pub mod apps;
pub mod engine;
pub mod error;
pub mod kv;
pub mod rpc;
pub mod storage;
pub mod task;

pub use apps::{app_by_name, Indexer, MapReduceApp, WordCount};
pub use error::{EngineError, EngineResult};
pub use kv::{bucket_for, ihash, KeyValue};
pub use rpc::{
    DoneResponse, JobSnapshot, ReportTaskRequest, ReportTaskResponse, TaskAssignmentRequest,
    TaskAssignmentResponse, TaskSource, WorkerId,
};
pub use storage::{intermediate_name, output_name, Storage};
pub use task::{Assignment, Phase, Task, TaskIndex, TaskStatus};
