//! Queue worker that reports the playback duration of media files.
//!
//! A job names a file. The [`handler::JobHandler`] validates the job and the
//! file, the [`resolver::DurationResolver`] asks ffprobe for a duration, and
//! the [`worker`] loop hands the result back to the queue.
pub mod config;
pub mod error;
pub mod handler;
pub mod resolver;
pub mod worker;

#[cfg(test)]
mod testing;

use md_ffprobe::FFProbe;

pub use config::{init_tracing, load_config, Config};
pub use error::{DurationError, Resolution, WorkerError};
pub use handler::{Acknowledgement, JobHandler};
pub use resolver::DurationResolver;

/// Locates ffprobe and wires up a handler from configuration.
///
/// # Errors
/// Returns an error if ffprobe cannot be found, so a misconfigured worker
/// fails at startup rather than on its first job.
pub fn build_handler(
    config: &Config,
) -> Result<JobHandler<FFProbe>, WorkerError> {
    let binary = FFProbe::locate(config.ffprobe_path.as_deref())?;

    let ffprobe = FFProbe::new(binary)
        .with_timeout(config.probe_timeout())
        .with_seek_offset(config.seek_offset_secs);

    let untrusted_formats = config.untrusted_formats();
    tracing::info!("Header duration untrusted for: {}", untrusted_formats);

    Ok(JobHandler::new(DurationResolver::new(ffprobe, untrusted_formats)))
}
