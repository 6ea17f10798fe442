use serde::Deserialize;

use crate::header::NumberOrString;

/*
Sample packets-mode output, read from the seek offset to the end
{
    "packets": [
        {
            "pts_time": "210.651429"
        },
        {
            "pts_time": "210.677551"
        },
        {
            "pts_time": "210.703673"
        }
    ]
}
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbePacketResult {
    pub last_packet_timestamp: f64,
}

#[derive(Debug, Deserialize)]
struct Packet {
    pts_time: Option<NumberOrString>,
}

#[derive(Debug, Deserialize)]
struct PacketsOutput {
    packets: Option<Vec<Packet>>,
}

/// Finds the presentation timestamp of the last packet in packets-mode
/// output.
///
/// Packets are taken in the order ffprobe delivered them. Packets without a
/// usable `pts_time` are skipped.
pub fn extract_last_packet_timestamp(
    raw_output: &str,
) -> Option<ProbePacketResult> {
    let output: PacketsOutput = match serde_json::from_str(raw_output) {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!("Failed to parse ffprobe packet output: {}", err);
            return None;
        }
    };

    let packets = output.packets?;
    tracing::debug!("ffprobe returned {} packets", packets.len());

    packets
        .iter()
        .rev()
        .find_map(|packet| packet.pts_time.as_ref()?.to_seconds())
        .map(|last_packet_timestamp| ProbePacketResult {
            last_packet_timestamp,
        })
}
