use nom::IResult;

use crate::endianness::{PcapBE, PcapEndianness, PcapLE};

/// Size of a legacy record header, in bytes
pub const PCAP_RECORD_HEADER_LEN: usize = 16;

/// Container for network data in legacy Pcap files
#[derive(Debug)]
pub struct LegacyPcapBlock<'a> {
    pub ts_sec: u32,
    /// Microseconds, or nanoseconds for nanosecond-precision captures
    pub ts_frac: u32,
    pub caplen: u32,
    pub origlen: u32,
    /// Packet data. Shorter than `caplen` only if the input was truncated.
    pub data: &'a [u8],
}

impl<'a> LegacyPcapBlock<'a> {
    /// Returns true if fewer than `caplen` bytes of packet data were available
    #[inline]
    pub fn truncated(&self) -> bool {
        self.data.len() < self.caplen as usize
    }
}

/// Read a PCAP record header and data
///
/// Each PCAP record starts with a small header, and is followed by packet data.
/// The packet data format depends on the LinkType.
///
/// The header must be complete. Packet data is taken up to `caplen` bytes, or whatever remains
/// of the input if it is shorter, so that a truncated final record can still be decoded.
fn parse_pcap_frame<En: PcapEndianness>(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock> {
    let (i, ts_sec) = En::parse_u32(i)?;
    let (i, ts_frac) = En::parse_u32(i)?;
    let (i, caplen) = En::parse_u32(i)?;
    let (i, origlen) = En::parse_u32(i)?;
    let (data, rem) = i.split_at((caplen as usize).min(i.len()));
    let block = LegacyPcapBlock {
        ts_sec,
        ts_frac,
        caplen,
        origlen,
        data,
    };
    Ok((rem, block))
}

/// Read a PCAP record header and data (little-endian)
pub fn parse_pcap_frame_le(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock> {
    parse_pcap_frame::<PcapLE>(i)
}

/// Read a PCAP record header and data (big-endian)
pub fn parse_pcap_frame_be(i: &[u8]) -> IResult<&[u8], LegacyPcapBlock> {
    parse_pcap_frame::<PcapBE>(i)
}
