//! Parse result
//!
//! Once all frames are decoded, flows are turned into session records: timestamps relative to
//! the start of the capture, the externally-routable endpoint, and its location when a locator
//! is available.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use serde::Serialize;

use crate::capture::{CaptureFormat, CaptureMetadata};
use crate::geo::{is_private_or_reserved, GeoCache, GeoLocation, GeoLocator};
use crate::packet::TransportProtocol;
use crate::progress::{Progress, ProgressScale, PHASE_RESOLVE};
use crate::session::Flow;

/// One TCP or UDP session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionRecord {
    pub stream_id: u64,
    pub source_ip: Ipv4Addr,
    pub destination_ip: Ipv4Addr,
    pub source_port: u16,
    pub destination_port: u16,
    pub protocol: TransportProtocol,
    /// Absolute times, in seconds since the epoch
    pub start_time: f64,
    pub end_time: f64,
    /// Seconds since the first frame of the capture
    pub relative_start: f64,
    pub relative_end: f64,
    pub packet_count: u64,
    pub total_bytes: u64,
    pub closed: bool,
    pub external_ip: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeoLocation>,
}

/// Result of a capture parse
#[derive(Clone, Debug, Serialize)]
pub struct CaptureReport {
    pub format: CaptureFormat,
    pub total_packets: u64,
    pub total_bytes: u64,
    /// Timestamp of the earliest frame, `None` if the capture has no frame
    pub capture_start_time: Option<f64>,
    pub capture_duration: f64,
    pub total_sessions: usize,
    /// Sessions, ordered by stream id
    pub sessions: Vec<SessionRecord>,
    /// Time the report was built, in seconds since the epoch
    pub processed_at: u64,
}

/// Select the endpoint to geolocate: the first address outside private and reserved ranges
pub fn external_endpoint(a: Ipv4Addr, b: Ipv4Addr) -> Option<Ipv4Addr> {
    if !is_private_or_reserved(a) {
        Some(a)
    } else if !is_private_or_reserved(b) {
        Some(b)
    } else {
        None
    }
}

/// Build the report from the capture totals and the flow table
///
/// With `geo`, each session's external endpoint is looked up through the cache. Progress is
/// reported in the 85-99% range while sessions are processed.
pub fn finalize(
    meta: &CaptureMetadata,
    flows: Vec<Flow>,
    geo: Option<(&dyn GeoLocator, &GeoCache)>,
    progress: &mut dyn Progress,
) -> CaptureReport {
    let base = meta.first_timestamp.unwrap_or_default();
    let total = flows.len() as u64;
    let mut scale = ProgressScale::new(85, 99, 1);
    let mut located = 0usize;
    let mut sessions = Vec::with_capacity(flows.len());
    for (n, flow) in flows.into_iter().enumerate() {
        let external_ip = external_endpoint(flow.src.ip, flow.dst.ip);
        let geolocation = match (external_ip, geo) {
            (Some(ip), Some((locator, cache))) => cache.get_or_locate(ip, locator),
            _ => None,
        };
        if geolocation.is_some() {
            located += 1;
        }
        sessions.push(SessionRecord {
            stream_id: flow.id,
            source_ip: flow.src.ip,
            destination_ip: flow.dst.ip,
            source_port: flow.src.port,
            destination_port: flow.dst.port,
            protocol: flow.protocol,
            start_time: flow.start.as_secs_f64(),
            end_time: flow.end.as_secs_f64(),
            relative_start: flow.start.secs_since(base),
            relative_end: flow.end.secs_since(base),
            packet_count: flow.packet_count,
            total_bytes: flow.byte_count,
            closed: flow.closed,
            external_ip,
            geolocation,
        });
        if let Some(p) = scale.advance(n as u64 + 1, total) {
            progress.update(p, PHASE_RESOLVE);
        }
    }
    if geo.is_some() {
        debug!("located {} of {} sessions", located, sessions.len());
    }
    let report = CaptureReport {
        format: meta.format,
        total_packets: meta.frame_count,
        total_bytes: meta.byte_count,
        capture_start_time: meta.first_timestamp.map(|t| t.as_secs_f64()),
        capture_duration: meta.duration(),
        total_sessions: sessions.len(),
        sessions,
        processed_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };
    info!(
        "{} capture: {} packets, {} bytes, {} sessions, {:.6}s",
        report.format,
        report.total_packets,
        report.total_bytes,
        report.total_sessions,
        report.capture_duration
    );
    report
}
