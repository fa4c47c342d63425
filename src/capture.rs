use std::fmt;

use serde::Serialize;

use crate::endianness::Endianness;
use crate::linktype::Linktype;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Container format of a capture file
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CaptureFormat {
    /// Legacy libpcap format: one global header, then fixed 16-byte record headers
    #[serde(rename = "pcap")]
    Legacy,
    /// pcapng: a sequence of self-delimited blocks
    #[serde(rename = "pcapng")]
    BlockBased,
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptureFormat::Legacy => f.write_str("pcap"),
            CaptureFormat::BlockBased => f.write_str("pcapng"),
        }
    }
}

/// Absolute frame timestamp, in nanoseconds since the epoch
///
/// Timestamps stay integral during decoding so that differences between two frames are exact;
/// conversion to floating-point seconds only happens when building the report.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Build a timestamp from seconds and a fractional part expressed in `units_per_sec`
    pub fn from_parts(secs: u64, frac: u64, units_per_sec: u64) -> Timestamp {
        let frac_ns = if units_per_sec == NANOS_PER_SEC {
            frac
        } else {
            ((frac as u128 * NANOS_PER_SEC as u128) / units_per_sec.max(1) as u128) as u64
        };
        Timestamp(
            secs.saturating_mul(NANOS_PER_SEC)
                .saturating_add(frac_ns),
        )
    }

    /// Build a timestamp from a raw tick count at the given resolution (ticks per second)
    pub fn from_ticks(ticks: u64, units_per_sec: u64) -> Timestamp {
        let units = units_per_sec.max(1);
        Timestamp::from_parts(ticks / units, ticks % units, units)
    }

    #[inline]
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        (self.0 / NANOS_PER_SEC) as f64 + (self.0 % NANOS_PER_SEC) as f64 / NANOS_PER_SEC as f64
    }

    /// Seconds elapsed since `earlier`, or 0 if `earlier` is later than `self`
    #[inline]
    pub fn secs_since(self, earlier: Timestamp) -> f64 {
        Timestamp(self.0.saturating_sub(earlier.0)).as_secs_f64()
    }
}

/// One captured frame, as yielded by a frame reader
///
/// The data borrows the reader's buffer and is only valid until the next call to
/// [`FrameReader::next_frame`](crate::FrameReader::next_frame).
#[derive(Debug)]
pub struct DecodedFrame<'a> {
    pub timestamp: Timestamp,
    /// Captured length declared by the record header
    ///
    /// Larger than `data.len()` when the record was cut by the end of input, or when a packet
    /// block declares more data than it holds.
    pub captured_len: u32,
    pub linktype: Linktype,
    pub data: &'a [u8],
}

/// Capture-wide information
///
/// Format fields are set by the container detector; counters are updated by the decode loop
/// through [`CaptureMetadata::record_frame`].
#[derive(Clone, Debug)]
pub struct CaptureMetadata {
    pub format: CaptureFormat,
    pub endianness: Endianness,
    /// Data link type from the legacy global header (pcapng declares it per interface)
    pub linktype: Option<Linktype>,
    /// Legacy captures only: record timestamps carry nanoseconds instead of microseconds
    pub nanosecond_precision: bool,
    pub version_major: u16,
    pub version_minor: u16,
    pub frame_count: u64,
    pub byte_count: u64,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
}

impl CaptureMetadata {
    pub fn new(format: CaptureFormat, endianness: Endianness) -> CaptureMetadata {
        CaptureMetadata {
            format,
            endianness,
            linktype: None,
            nanosecond_precision: false,
            version_major: 0,
            version_minor: 0,
            frame_count: 0,
            byte_count: 0,
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    /// Account one frame in the capture totals
    ///
    /// First/last timestamps are the minimum and maximum seen, so that out-of-order frames
    /// cannot produce negative relative times.
    pub fn record_frame(&mut self, ts: Timestamp, len: u32) {
        self.frame_count += 1;
        self.byte_count += u64::from(len);
        self.first_timestamp = Some(self.first_timestamp.map_or(ts, |t| t.min(ts)));
        self.last_timestamp = Some(self.last_timestamp.map_or(ts, |t| t.max(ts)));
    }

    /// Capture duration in seconds (0 when fewer than two distinct timestamps were seen)
    pub fn duration(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => last.secs_since(first),
            _ => 0.0,
        }
    }
}
