use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod redis_queue;

pub use redis_queue::RedisQueue;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Failed to serialize job event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A job taken off the queue. `body` is the raw payload exactly as it was
/// submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    pub key: String,
    pub body: Vec<u8>,
}

/// Delivers jobs and accepts exactly one terminal call per job.
pub trait JobQueue {
    /// Waits for the next job. `Ok(None)` means the wait timed out with
    /// nothing queued.
    fn next_job(
        &mut self,
    ) -> impl Future<Output = Result<Option<QueuedJob>, QueueError>>;

    /// Acknowledges a job as successful with a payload.
    fn complete(
        &mut self,
        job: &QueuedJob,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), QueueError>>;

    /// Acknowledges a job as failed with a human-readable message.
    fn fail(
        &mut self,
        job: &QueuedJob,
        message: &str,
    ) -> impl Future<Output = Result<(), QueueError>>;
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Complete,
    Failed,
    Invalid,
}

impl JobStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            _ => Self::Invalid,
        }
    }
}

fn generate_job_key(id: &uuid::Uuid) -> String {
    format!("job:item:{id}")
}
