use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md_ffprobe::Prober;
use md_queue::{JobQueue, QueueError};

use crate::handler::{Acknowledgement, JobHandler};

/// Takes at most one job off the queue, handles it and acknowledges it.
///
/// # Returns
/// `true` if a job was processed, `false` if the queue wait timed out.
///
/// # Errors
/// Returns an error if the queue cannot deliver a job. Failures to
/// acknowledge a job are logged and do not stop the worker.
pub async fn process_next<Q, P>(
    queue: &mut Q,
    handler: &JobHandler<P>,
) -> Result<bool, QueueError>
where
    Q: JobQueue,
    P: Prober,
{
    let Some(job) = queue.next_job().await? else {
        return Ok(false);
    };

    let ack = match handler.handle(&job.key, &job.body).await {
        Acknowledgement::Success(payload) => {
            queue.complete(&job, &payload).await
        }
        Acknowledgement::Failure(message) => queue.fail(&job, &message).await,
    };

    if let Err(e) = ack {
        tracing::error!("Failed to acknowledge job {}: {}", job.key, e);
    }

    Ok(true)
}

/// Processes jobs one at a time until `shutdown` is set.
///
/// The flag is checked between jobs, so a job in flight always gets its
/// terminal call.
///
/// # Errors
/// Returns an error if the queue cannot deliver jobs.
pub async fn run<Q, P>(
    queue: &mut Q,
    handler: &JobHandler<P>,
    shutdown: &AtomicBool,
) -> Result<(), QueueError>
where
    Q: JobQueue,
    P: Prober,
{
    tracing::info!("Starting duration worker");

    while !shutdown.load(Ordering::SeqCst) {
        process_next(queue, handler).await?;
    }

    tracing::info!("Duration worker stopped");

    Ok(())
}

/// Returns a flag that is set once Ctrl-C is received.
pub fn shutdown_on_ctrl_c() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, finishing current job");
                flag.store(true, Ordering::SeqCst);
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    shutdown
}
