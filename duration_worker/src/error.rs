use md_ffprobe::LocateError;
use md_queue::QueueError;
use thiserror::Error;

/// Terminal failure for a single job. The display text is the message handed
/// back to the queue and written to the error log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationError {
    #[error("Job payload was malformed.")]
    MalformedJob,
    #[error("Media file was not found.")]
    FileNotFound,
    #[error("Media file is not readable.")]
    FileUnreadable,
    #[error("Unable to probe media file.")]
    ProbeUnavailable,
    #[error("Unable to scan media packets.")]
    PacketScanFailed,
}

/// Outcome of resolving one job: whole seconds, or a typed failure.
pub type Resolution = Result<u64, DurationError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to load config: {0}")]
    Config(#[from] figment::Error),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("REDIS_URL must be set")]
    MissingRedisUrl,
    #[error("Failed to encode job payload: {0}")]
    Encode(#[from] serde_json::Error),
}
