use async_trait::async_trait;
use serde_json::Value;

/// Named work queue used to schedule background jobs.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    fn name(&self) -> &str;

    /// Pushes a job for `task` and returns the job id.
    async fn enqueue(&self, task: &str, payload: Value) -> Result<String, QueueError>;

    /// Number of jobs waiting on the queue.
    async fn len(&self) -> Result<usize, QueueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Failed to serialize job: {0}")]
    Serialization(#[from] serde_json::Error),
}
