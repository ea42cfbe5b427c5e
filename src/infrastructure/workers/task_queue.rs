use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::domain::ports::task_queue::{QueueError, TaskQueue};
use crate::infrastructure::providers::CacheClient;

pub const DEFAULT_QUEUE_NAME: &str = "microblog-tasks";

/// Job envelope stored on the queue list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedJob {
    pub id: String,
    pub task: String,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedJob {
    pub fn new(task: &str, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task: task.to_string(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// Redis implementation of the TaskQueue
pub struct RedisTaskQueue {
    name: String,
    cache: CacheClient,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisTaskQueue {
    pub fn new(name: impl Into<String>, cache: CacheClient) -> Self {
        Self {
            name: name.into(),
            cache,
            connection: OnceCell::new(),
        }
    }

    pub fn cache(&self) -> &CacheClient {
        &self.cache
    }

    /// Redis list holding the queued jobs.
    pub fn key(&self) -> String {
        format!("rq:queue:{}", self.name)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, QueueError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                self.cache.client().get_multiplexed_async_connection().await
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, task: &str, payload: Value) -> Result<String, QueueError> {
        let job = QueuedJob::new(task, payload);
        let body = serde_json::to_string(&job)?;

        let mut conn = self.connection().await?;
        let _: usize = conn.rpush(self.key(), body).await?;

        tracing::debug!("Enqueued job {} ({}) on {}", job.id, job.task, self.name);
        Ok(job.id)
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let mut conn = self.connection().await?;
        let len: usize = conn.llen(self.key()).await?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_key_uses_name() {
        let cache = CacheClient::from_url("redis://localhost:6379").unwrap();
        let queue = RedisTaskQueue::new(DEFAULT_QUEUE_NAME, cache);

        assert_eq!(queue.name(), "microblog-tasks");
        assert_eq!(queue.key(), "rq:queue:microblog-tasks");
    }

    #[test]
    fn test_job_envelope_serializes_task_and_payload() {
        let job = QueuedJob::new("export_posts", json!({"user_id": 7}));
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["task"], "export_posts");
        assert_eq!(value["payload"]["user_id"], 7);
        assert_eq!(value["id"].as_str().unwrap().len(), 36);
    }

    #[tokio::test]
    async fn test_enqueue_fails_when_store_is_unreachable() {
        // Nothing listens on port 1
        let cache = CacheClient::from_url("redis://127.0.0.1:1").unwrap();
        let queue = RedisTaskQueue::new(DEFAULT_QUEUE_NAME, cache);

        let result = queue.enqueue("export_posts", json!({})).await;
        assert!(matches!(result, Err(QueueError::Backend(_))));
    }
}
