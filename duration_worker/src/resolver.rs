use std::path::Path;

use md_ffprobe::{
    extract_header, extract_last_packet_timestamp, FormatSet, Prober,
};

use crate::error::{DurationError, Resolution};

/// Decides which duration signal to trust for a file.
///
/// Container metadata is used unless the container reports one of the
/// untrusted formats. MP3 headers are often missing or wrong for variable
/// bitrate files, so for those the timestamp of the last audio packet is
/// used instead.
#[derive(Debug, Clone)]
pub struct DurationResolver<P> {
    prober: P,
    untrusted_formats: FormatSet,
}

impl<P: Prober> DurationResolver<P> {
    pub const fn new(prober: P, untrusted_formats: FormatSet) -> Self {
        Self {
            prober,
            untrusted_formats,
        }
    }

    pub const fn prober(&self) -> &P {
        &self.prober
    }

    /// # Errors
    /// `ProbeUnavailable` if the header probe yields nothing usable,
    /// `PacketScanFailed` if a required packet scan yields no packets.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, path: &Path) -> Resolution {
        let header = self
            .prober
            .probe_header(path)
            .await
            .as_deref()
            .and_then(extract_header)
            .ok_or(DurationError::ProbeUnavailable)?;

        tracing::debug!(
            "Header reports formats {} with duration {}",
            header.format_names,
            header.duration_seconds
        );

        if !header.format_names.intersects(&self.untrusted_formats) {
            return Ok(round_seconds(header.duration_seconds));
        }

        tracing::debug!(
            "Header duration is untrusted for {}, scanning packets",
            header.format_names
        );

        let packets = self
            .prober
            .probe_packets(path)
            .await
            .as_deref()
            .and_then(extract_last_packet_timestamp)
            .ok_or(DurationError::PacketScanFailed)?;

        Ok(round_seconds(packets.last_packet_timestamp))
    }
}

/// Rounds half away from zero. Inputs are never negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_seconds(seconds: f64) -> u64 {
    seconds.round() as u64
}
