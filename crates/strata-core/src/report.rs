use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::packet::LayerKind;
use crate::registry::default_registry;
use crate::source::{FrameEvent, FrameSource, PcapFileSource, SourceError};
use crate::{REPORT_VERSION, dissect_frame, linktype_code};

/// Error raised while producing a capture report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Dissection report over a whole capture, with deterministic ordering:
/// packets appear in capture order, layers outer to inner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Capture totals and time bounds.
    pub capture_summary: CaptureSummary,
    /// Per-packet layer summaries in capture order.
    pub packets: Vec<PacketSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture totals; timestamps may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    /// Packets whose chains contain at least one illegal-data node.
    pub packets_with_illegal_data: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// One dissected packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSummary {
    /// Zero-based position in the capture.
    pub index: u64,
    /// RFC3339 capture timestamp, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Total chain length in bytes.
    pub length: u64,
    /// Layers outer to inner.
    pub layers: Vec<LayerSummary>,
    /// True when the chain contains an illegal-data node.
    pub has_illegal_data: bool,
}

/// One layer of a dissected packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    pub kind: LayerKind,
    pub length: u64,
    /// One-line field summary (addresses, ports, or the causal error).
    pub info: String,
}

/// Dissect every frame of a capture file into a report.
pub fn dissect_pcap_file(path: &Path) -> Result<Report, ReportError> {
    let source = PcapFileSource::open(path)?;
    dissect_source(path, source)
}

/// Dissect every frame from `source` into a report.
pub fn dissect_source<S: FrameSource>(path: &Path, mut source: S) -> Result<Report, ReportError> {
    let mut packets = Vec::new();
    let mut packets_with_illegal_data = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;

    let mut index = 0u64;
    while let Some(FrameEvent { ts, linktype, data }) = source.next_frame()? {
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        // The span covers the whole frame buffer, so this cannot fail;
        // an unparseable frame still dissects into raw or illegal nodes.
        let packet = match dissect_frame(
            default_registry(),
            linktype_code(linktype),
            &data,
            0,
            data.len(),
        ) {
            Ok(packet) => packet,
            Err(_) => continue,
        };

        let has_illegal_data = packet.contains(LayerKind::Illegal);
        if has_illegal_data {
            packets_with_illegal_data += 1;
        }
        packets.push(PacketSummary {
            index,
            ts: ts_to_rfc3339(ts),
            length: packet.len() as u64,
            layers: packet
                .layers()
                .map(|node| LayerSummary {
                    kind: node.layer().kind(),
                    length: node.layer().len() as u64,
                    info: node.layer().summary(),
                })
                .collect(),
            has_illegal_data,
        });
        index += 1;
    }

    let capture_summary = CaptureSummary {
        packets_total: packets.len() as u64,
        packets_with_illegal_data,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    };
    let generated_at = capture_summary
        .time_end
        .clone()
        .or_else(|| capture_summary.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());

    Ok(Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "strata".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at,
        input: InputInfo {
            path: path.display().to_string(),
            bytes: path.metadata().map(|meta| meta.len()).unwrap_or(0),
        },
        capture_summary,
        packets,
    })
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let ts = match ts {
        Some(ts) => ts,
        None => return,
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
