use std::io::ErrorKind;
use std::path::Path;

use md_ffprobe::Prober;
use types::{DurationResponse, Job};

use crate::error::{DurationError, Resolution};
use crate::resolver::DurationResolver;

/// Terminal answer for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// JSON `{"duration": <seconds>}`.
    Success(Vec<u8>),
    /// Human-readable failure message.
    Failure(String),
}

/// Validates a job, resolves its duration and turns the outcome into an
/// acknowledgement.
#[derive(Debug, Clone)]
pub struct JobHandler<P> {
    resolver: DurationResolver<P>,
}

impl<P: Prober> JobHandler<P> {
    pub const fn new(resolver: DurationResolver<P>) -> Self {
        Self { resolver }
    }

    pub const fn resolver(&self) -> &DurationResolver<P> {
        &self.resolver
    }

    /// Handles one raw job body. Never fails: every outcome becomes either a
    /// success or a failure acknowledgement.
    #[tracing::instrument(skip(self, body))]
    pub async fn handle(&self, key: &str, body: &[u8]) -> Acknowledgement {
        let failure = match self.process(body).await {
            Ok(duration) => match (DurationResponse { duration }).to_vec() {
                Ok(payload) => {
                    tracing::info!(duration, "done");
                    return Acknowledgement::Success(payload);
                }
                Err(e) => format!("Failed to encode duration: {e}"),
            },
            Err(e) => e.to_string(),
        };

        tracing::error!("{}", failure);
        Acknowledgement::Failure(failure)
    }

    async fn process(&self, body: &[u8]) -> Resolution {
        let job = Job::from_slice(body).map_err(|e| {
            tracing::debug!("Failed to decode job payload: {}", e);
            DurationError::MalformedJob
        })?;

        let path = Path::new(&job.filename);
        validate_file(path).await?;

        self.resolver.resolve(path).await
    }
}

/// Checks that `path` names an existing, readable regular file.
async fn validate_file(path: &Path) -> Result<(), DurationError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DurationError::FileNotFound);
        }
        Err(e) => {
            tracing::debug!("Failed to stat {}: {}", path.display(), e);
            return Err(DurationError::FileUnreadable);
        }
    };

    if !metadata.is_file() {
        return Err(DurationError::FileUnreadable);
    }

    if let Err(e) = tokio::fs::File::open(path).await {
        tracing::debug!("Failed to open {}: {}", path.display(), e);
        return Err(DurationError::FileUnreadable);
    }

    Ok(())
}
