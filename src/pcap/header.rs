use nom::number::complete::{be_i32, be_u16, be_u32, le_i32, le_u16, le_u32};
use nom::IResult;

use crate::endianness::Endianness;
use crate::linktype::Linktype;

/// Size of the legacy global header, in bytes
pub const PCAP_HEADER_LEN: usize = 24;

/// Magic numbers, as read in little-endian order
pub const PCAP_MAGIC_USEC: u32 = 0xa1b2_c3d4;
pub const PCAP_MAGIC_NSEC: u32 = 0xa1b2_3c4d;
pub const PCAP_MAGIC_USEC_SWAPPED: u32 = 0xd4c3_b2a1;
pub const PCAP_MAGIC_NSEC_SWAPPED: u32 = 0x4d3c_b2a1;

/// PCAP global header
#[derive(Clone, Debug)]
pub struct PcapHeader {
    /// File format and byte ordering. If equal to `0xa1b2c3d4` or `0xa1b23c4d` then the rest of
    /// the file uses native byte ordering. If `0xd4c3b2a1` or `0x4d3cb2a1` (swapped), then all
    /// following fields will have to be swapped too.
    pub magic_number: u32,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the following
    /// packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub fn endianness(&self) -> Endianness {
        if (self.magic_number & 0xFFFF) == 0xb2a1 {
            // works for both nanosecond and microsecond resolution timestamps
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    pub fn is_nanosecond_precision(&self) -> bool {
        self.magic_number == PCAP_MAGIC_NSEC || self.magic_number == PCAP_MAGIC_NSEC_SWAPPED
    }

    /// Number of timestamp fraction units per second
    pub fn ts_units_per_sec(&self) -> u64 {
        if self.is_nanosecond_precision() {
            1_000_000_000
        } else {
            1_000_000
        }
    }
}

/// Returns true if `magic` (read as little-endian) is a legacy pcap magic number
pub fn is_pcap_magic(magic: u32) -> bool {
    matches!(
        magic,
        PCAP_MAGIC_USEC | PCAP_MAGIC_NSEC | PCAP_MAGIC_USEC_SWAPPED | PCAP_MAGIC_NSEC_SWAPPED
    )
}

/// Read the PCAP global header
///
/// The input must contain the complete header; an unknown magic number is an error of kind
/// `Tag`.
pub fn parse_pcap_header(i: &[u8]) -> IResult<&[u8], PcapHeader> {
    let (i, magic_number) = le_u32(i)?;
    match magic_number {
        PCAP_MAGIC_USEC | PCAP_MAGIC_NSEC => {
            let (i, version_major) = le_u16(i)?;
            let (i, version_minor) = le_u16(i)?;
            let (i, thiszone) = le_i32(i)?;
            let (i, sigfigs) = le_u32(i)?;
            let (i, snaplen) = le_u32(i)?;
            let (i, network) = le_i32(i)?;
            let header = PcapHeader {
                magic_number,
                version_major,
                version_minor,
                thiszone,
                sigfigs,
                snaplen,
                network: Linktype(network),
            };
            Ok((i, header))
        }
        PCAP_MAGIC_USEC_SWAPPED | PCAP_MAGIC_NSEC_SWAPPED => {
            let (i, version_major) = be_u16(i)?;
            let (i, version_minor) = be_u16(i)?;
            let (i, thiszone) = be_i32(i)?;
            let (i, sigfigs) = be_u32(i)?;
            let (i, snaplen) = be_u32(i)?;
            let (i, network) = be_i32(i)?;
            let header = PcapHeader {
                magic_number,
                version_major,
                version_minor,
                thiszone,
                sigfigs,
                snaplen,
                network: Linktype(network),
            };
            Ok((i, header))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Tag,
        ))),
    }
}
