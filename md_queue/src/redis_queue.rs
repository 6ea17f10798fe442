use redis::{aio::MultiplexedConnection, AsyncCommands, Direction};
use serde_json::json;

use crate::{generate_job_key, JobQueue, JobStatus, QueueError, QueuedJob};

/// Reliable queue on top of Redis lists.
///
/// Job keys are pushed onto `queue_name`. A worker moves one key at a time
/// onto `<queue_name>:temp` while it works on it, so a crashed worker leaves
/// the key behind for inspection instead of losing it. Each job's payload and
/// status live in a hash under the job key.
#[derive(Clone)]
pub struct RedisQueue {
    con: MultiplexedConnection,
    queue_name: String,
    temp_queue_name: String,
    events_channel: String,
    poll_timeout_secs: f64,
}

impl std::fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQueue")
            .field("queue_name", &self.queue_name)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl RedisQueue {
    /// Opens a multiplexed connection to Redis.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(
        redis_url: &str,
        queue_name: &str,
        poll_timeout_secs: f64,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        let con = client.get_multiplexed_async_connection().await?;

        tracing::info!("Connected to redis, consuming queue {}", queue_name);

        Ok(Self {
            con,
            queue_name: queue_name.to_string(),
            temp_queue_name: format!("{queue_name}:temp"),
            events_channel: format!("{queue_name}:events"),
            poll_timeout_secs,
        })
    }

    /// Stores a new job and pushes it onto the queue.
    ///
    /// # Returns
    /// The key of the new job.
    ///
    /// # Errors
    /// Returns an error if Redis rejects the commands.
    pub async fn enqueue(&mut self, body: &[u8]) -> Result<String, QueueError> {
        let id = uuid::Uuid::now_v7();
        let key = generate_job_key(&id);
        let now = chrono::Utc::now().to_rfc3339();

        let _: () = redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(&key)
            .arg("id")
            .arg(id.to_string())
            .arg("payload")
            .arg(body)
            .arg("status")
            .arg(JobStatus::Queued.as_str())
            .arg("last_updated")
            .arg(&now)
            .ignore()
            .lpush(&self.queue_name, &key)
            .ignore()
            .query_async(&mut self.con)
            .await?;

        tracing::info!("Queued job {}", key);

        Ok(key)
    }

    async fn set_status(
        &mut self,
        key: &str,
        new_status: JobStatus,
    ) -> Result<(), QueueError> {
        let previous_status: Option<String> =
            self.con.hget(key, "status").await?;
        let previous_status = previous_status
            .as_deref()
            .map_or(JobStatus::Invalid, JobStatus::from);

        let now = chrono::Utc::now().to_rfc3339();

        let _: () = redis::pipe()
            .atomic()
            .hset(key, "status", new_status.as_str())
            .ignore()
            .hset(key, "last_updated", &now)
            .ignore()
            .query_async(&mut self.con)
            .await?;

        if previous_status != new_status {
            self.publish_status(key, previous_status, new_status).await?;
        }

        Ok(())
    }

    async fn publish_status(
        &mut self,
        key: &str,
        previous_status: JobStatus,
        new_status: JobStatus,
    ) -> Result<(), QueueError> {
        let message = serde_json::to_string(&json!({
            "event": "job_status_change",
            "key": key,
            "previous_status": previous_status,
            "new_status": new_status,
        }))?;

        let _: () = self.con.publish(&self.events_channel, message).await?;

        Ok(())
    }

    async fn finish(
        &mut self,
        job: &QueuedJob,
        field: &str,
        value: &[u8],
        status: JobStatus,
    ) -> Result<(), QueueError> {
        let _: () = self.con.hset(&job.key, field, value).await?;
        self.set_status(&job.key, status).await?;

        let _: () = self.con.lrem(&self.temp_queue_name, 1, &job.key).await?;

        Ok(())
    }
}

impl JobQueue for RedisQueue {
    async fn next_job(&mut self) -> Result<Option<QueuedJob>, QueueError> {
        let key: Option<String> = self
            .con
            .blmove(
                &self.queue_name,
                &self.temp_queue_name,
                Direction::Right,
                Direction::Left,
                self.poll_timeout_secs,
            )
            .await?;

        let Some(key) = key else {
            return Ok(None);
        };

        tracing::debug!("Got job key: {}", key);

        // A job whose hash has gone missing still gets a terminal call; the
        // empty body fails payload validation.
        let body: Option<Vec<u8>> = self.con.hget(&key, "payload").await?;
        let Some(body) = body else {
            tracing::warn!("Job {} has no payload", key);
            return Ok(Some(QueuedJob {
                key,
                body: Vec::new(),
            }));
        };

        self.set_status(&key, JobStatus::Processing).await?;

        Ok(Some(QueuedJob { key, body }))
    }

    async fn complete(
        &mut self,
        job: &QueuedJob,
        payload: &[u8],
    ) -> Result<(), QueueError> {
        self.finish(job, "result", payload, JobStatus::Complete).await
    }

    async fn fail(
        &mut self,
        job: &QueuedJob,
        message: &str,
    ) -> Result<(), QueueError> {
        self.finish(job, "error", message.as_bytes(), JobStatus::Failed)
            .await
    }
}
