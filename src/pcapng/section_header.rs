use nom::error::ParseError;
use nom::number::complete::{be_i64, le_i64, le_u32};
use nom::{Err, IResult};

use crate::endianness::{array_ref4, Endianness, PcapBE, PcapEndianness, PcapLE};

use super::*;

/// Minimum Section Header Block length: header, BOM, versions, section length and trailer
pub const SHB_MIN_LEN: usize = 28;

/// The Section Header Block (SHB) identifies the
/// beginning of a section of the capture capture file.
///
/// The
/// Section Header Block does not contain data but it rather identifies a
/// list of blocks (interfaces, packets) that are logically correlated.
#[derive(Debug)]
pub struct SectionHeaderBlock {
    pub block_type: u32,
    pub block_len1: u32,
    /// Byte-order magic, as read in little-endian order
    pub bom: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub section_len: i64,
    pub block_len2: u32,
}

impl SectionHeaderBlock {
    pub fn endianness(&self) -> Endianness {
        if self.bom == BOM_MAGIC {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }

    /// Returns true if the leading and trailing block lengths agree
    pub fn lengths_match(&self) -> bool {
        self.block_len1 == self.block_len2
    }
}

/// Resolve the byte order of a section from the first 12 bytes of its header
///
/// The byte-order marker is read in both orders and compared to the expected constant.
/// Returns `None` if neither interpretation matches.
pub fn section_endianness(i: &[u8]) -> Option<Endianness> {
    if i.len() < 12 {
        return None;
    }
    let bom = array_ref4(i, 8);
    if u32::from_le_bytes(bom) == BOM_MAGIC {
        Some(Endianness::Little)
    } else if u32::from_be_bytes(bom) == BOM_MAGIC {
        Some(Endianness::Big)
    } else {
        None
    }
}

fn parse_shb_content<'a, En: PcapEndianness, E: ParseError<&'a [u8]>>(
    block_type: u32,
    block_len1: u32,
    i: &'a [u8],
    block_len2: u32,
) -> IResult<&'a [u8], SectionHeaderBlock, E> {
    // caller function already tested header type(magic) and length
    // read end of header
    let (i, bom) = le_u32(i)?;
    let (i, major_version) = En::parse_u16(i)?;
    let (i, minor_version) = En::parse_u16(i)?;
    let (i, section_len) = match En::ENDIANNESS {
        Endianness::Little => le_i64(i)?,
        Endianness::Big => be_i64(i)?,
    };
    // options are not needed
    let block = SectionHeaderBlock {
        block_type,
        block_len1,
        bom,
        major_version,
        minor_version,
        section_len,
        block_len2,
    };
    Ok((i, block))
}

impl<'a, En: PcapEndianness> PcapNGBlockParser<'a, En, SectionHeaderBlock> for SectionHeaderBlock {
    const HDR_SZ: usize = SHB_MIN_LEN;
    const MAGIC: u32 = SHB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], SectionHeaderBlock, E> {
        parse_shb_content::<En, E>(block_type, block_len1, i, block_len2)
    }
}

/// Parse a Section Header Block (little endian)
pub fn parse_sectionheaderblock_le(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock> {
    ng_block_parser::<SectionHeaderBlock, PcapLE, _, _>()(i)
}

/// Parse a Section Header Block (big endian)
pub fn parse_sectionheaderblock_be(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock> {
    ng_block_parser::<SectionHeaderBlock, PcapBE, _, _>()(i)
}

/// Parse a SectionHeaderBlock (little or big endian)
///
/// The input must contain the complete block.
pub fn parse_sectionheaderblock(i: &[u8]) -> IResult<&[u8], SectionHeaderBlock> {
    match section_endianness(i) {
        Some(Endianness::Little) => parse_sectionheaderblock_le(i),
        Some(Endianness::Big) => parse_sectionheaderblock_be(i),
        None => Err(Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use hex_literal::hex;

    // minimal section header, no options
    pub const SHB_LE: &[u8] = &hex!(
        "
0A 0D 0D 0A 1C 00 00 00 4D 3C 2B 1A 01 00 00 00
FF FF FF FF FF FF FF FF 1C 00 00 00"
    );

    pub const SHB_BE: &[u8] = &hex!(
        "
0A 0D 0D 0A 00 00 00 1C 1A 2B 3C 4D 00 01 00 00
FF FF FF FF FF FF FF FF 00 00 00 1C"
    );

    #[test]
    fn test_parse_shb_le() {
        let (rem, shb) = parse_sectionheaderblock(SHB_LE).expect("could not parse SHB");
        assert!(rem.is_empty());
        assert_eq!(shb.endianness(), Endianness::Little);
        assert_eq!(shb.major_version, 1);
        assert_eq!(shb.minor_version, 0);
        assert_eq!(shb.section_len, -1);
        assert!(shb.lengths_match());
    }

    #[test]
    fn test_parse_shb_be() {
        let (rem, shb) = parse_sectionheaderblock(SHB_BE).expect("could not parse SHB");
        assert!(rem.is_empty());
        assert_eq!(shb.endianness(), Endianness::Big);
        assert_eq!(shb.major_version, 1);
        assert_eq!(shb.block_len1, 28);
    }

    #[test]
    fn test_unknown_bom() {
        let mut shb = SHB_LE.to_vec();
        shb[8] = 0;
        assert_eq!(section_endianness(&shb), None);
        assert!(parse_sectionheaderblock(&shb).is_err());
    }

    #[test]
    fn test_short_shb_is_rejected() {
        let mut shb = SHB_LE.to_vec();
        shb[4] = 0x14;
        assert!(parse_sectionheaderblock(&shb).is_err());
    }
}
