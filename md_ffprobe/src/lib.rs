//! Thin wrapper around the `ffprobe` command line tool.
//!
//! Probing is split in two: the [`Prober`] port spawns the tool and hands
//! back its raw JSON output, and the [`header`] and [`packets`] modules turn
//! that output into typed results. Callers that only need fake output in
//! tests implement [`Prober`] themselves.
use std::future::Future;
use std::path::Path;

pub mod header;
pub mod invoker;
pub mod packets;

pub use header::{extract_header, FormatSet, ProbeHeaderResult};
pub use invoker::{FFProbe, LocateError};
pub use packets::{extract_last_packet_timestamp, ProbePacketResult};

/// Seek target, in seconds, used when scanning packets. Five days is past the
/// end of nearly every file, so ffprobe only returns the tail packets.
pub const DEFAULT_OFFSET: u64 = 432_000;

/// Runs the introspection tool against a file.
///
/// Both calls return the tool's raw standard output, or `None` when the tool
/// produced no usable signal (spawn failure, non-zero exit, timeout or empty
/// output).
pub trait Prober {
    /// Container format name and file-level duration only.
    fn probe_header(&self, path: &Path) -> impl Future<Output = Option<String>>;

    /// Audio packet presentation timestamps, starting at the seek offset.
    fn probe_packets(
        &self,
        path: &Path,
    ) -> impl Future<Output = Option<String>>;
}
