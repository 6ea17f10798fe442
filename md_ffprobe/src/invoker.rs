use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::{process::Command, time::timeout};

use crate::{Prober, DEFAULT_OFFSET};

const DEFAULT_BINARY: &str = "ffprobe";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to find ffprobe executable {name:?}: {source}")]
    NotFound {
        name: PathBuf,
        #[source]
        source: which::Error,
    },
}

/// Spawns `ffprobe` once per probe and captures its JSON output.
#[derive(Debug, Clone)]
pub struct FFProbe {
    binary: PathBuf,
    timeout: Duration,
    seek_offset: u64,
}

impl FFProbe {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            timeout: DEFAULT_TIMEOUT,
            seek_offset: DEFAULT_OFFSET,
        }
    }

    /// Resolves the ffprobe executable once, at startup.
    ///
    /// # Arguments
    /// configured - An explicit path or command name. Defaults to `ffprobe`
    /// looked up on `PATH`.
    ///
    /// # Errors
    /// Returns an error if the executable does not exist or is not
    /// executable.
    pub fn locate(configured: Option<&Path>) -> Result<PathBuf, LocateError> {
        let name = configured.unwrap_or_else(|| Path::new(DEFAULT_BINARY));

        let binary = match which::which(name) {
            Ok(binary) => binary,
            Err(source) => {
                return Err(LocateError::NotFound {
                    name: name.to_path_buf(),
                    source,
                });
            }
        };

        tracing::info!("Using ffprobe at {}", binary.display());

        Ok(binary)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_seek_offset(mut self, seek_offset: u64) -> Self {
        self.seek_offset = seek_offset;
        self
    }

    fn header_args() -> Vec<String> {
        [
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-select_streams",
            "a:0",
            "-show_entries",
            "format=format_name,duration",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn packet_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-select_streams".to_string(),
            "a:0".to_string(),
            // Start reading at the offset and continue to the end. Seeking
            // past the end lands on the last keyframe, so only the tail of the
            // stream is returned.
            "-read_intervals".to_string(),
            format!("{}%", self.seek_offset),
            "-show_entries".to_string(),
            "packet=pts_time".to_string(),
        ]
    }

    #[tracing::instrument(skip(self, args))]
    async fn run(&self, args: Vec<String>, path: &Path) -> Option<String> {
        let child = match Command::new(&self.binary)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to spawn ffprobe: {}", e);
                return None;
            }
        };

        // Dropping the child on timeout kills it.
        let wait = timeout(self.timeout, child.wait_with_output());
        let output = match wait.await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!("Failed to wait for ffprobe: {}", e);
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    "ffprobe timed out after {} seconds",
                    self.timeout.as_secs_f64()
                );
                return None;
            }
        };

        if !output.status.success() {
            tracing::warn!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
            return None;
        }

        let stdout = match String::from_utf8(output.stdout) {
            Ok(stdout) => stdout,
            Err(e) => {
                tracing::warn!("ffprobe output is not valid UTF-8: {}", e);
                return None;
            }
        };

        if stdout.trim().is_empty() {
            tracing::debug!("ffprobe produced no output");
            return None;
        }

        tracing::trace!("ffprobe output: {}", stdout);

        Some(stdout)
    }
}

impl Prober for FFProbe {
    async fn probe_header(&self, path: &Path) -> Option<String> {
        tracing::info!("Probing header of {}", path.display());
        self.run(Self::header_args(), path).await
    }

    async fn probe_packets(&self, path: &Path) -> Option<String> {
        tracing::info!("Scanning packets of {}", path.display());
        self.run(self.packet_args(), path).await
    }
}
