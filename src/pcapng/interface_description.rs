use nom::error::ParseError;
use nom::IResult;

use crate::endianness::{PcapBE, PcapEndianness, PcapLE};
use crate::linktype::Linktype;

use super::*;

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
    /// Raw `if_tsresol` option, if present
    pub if_tsresol: Option<u8>,
    pub if_tsoffset: i64,
}

impl<'a> InterfaceDescriptionBlock<'a> {
    /// Decode the interface time resolution, in units per second
    ///
    /// Interfaces without `if_tsresol` use nanoseconds. Return `None` if the resolution is
    /// invalid (for ex. greater than `2^64`).
    #[inline]
    pub fn ts_resolution(&self) -> Option<u64> {
        match self.if_tsresol {
            Some(r) => build_ts_resolution(r),
            None => Some(DEFAULT_TS_RESOLUTION),
        }
    }

    /// Return the interface timestamp offset, in seconds
    #[inline]
    pub fn ts_offset(&self) -> i64 {
        self.if_tsoffset
    }
}

impl<'a, En: PcapEndianness> PcapNGBlockParser<'a, En, InterfaceDescriptionBlock<'a>>
    for InterfaceDescriptionBlock<'a>
{
    const HDR_SZ: usize = 20;
    const MAGIC: u32 = IDB_MAGIC;

    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], InterfaceDescriptionBlock<'a>, E> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, linktype) = En::parse_u16(i)?;
        let (i, reserved) = En::parse_u16(i)?;
        let (i, snaplen) = En::parse_u32(i)?;
        // read options
        let (i, options) = parse_options::<En, E>(i)?;
        let mut if_tsresol = None;
        let mut if_tsoffset = 0;
        for opt in &options {
            match opt.code {
                OptionCode::IfTsresol => {
                    if if_tsresol.is_none() {
                        if_tsresol = opt.as_u8();
                    }
                }
                OptionCode::IfTsoffset => {
                    if let Some(offset) = opt.as_i64(En::ENDIANNESS) {
                        if_tsoffset = offset;
                    }
                }
                _ => (),
            }
        }
        let block = InterfaceDescriptionBlock {
            block_type,
            block_len1,
            linktype: Linktype(i32::from(linktype)),
            reserved,
            snaplen,
            options,
            block_len2,
            if_tsresol,
            if_tsoffset,
        };
        Ok((i, block))
    }
}

/// Parse an Interface Description Block (little-endian)
pub fn parse_interfacedescriptionblock_le(i: &[u8]) -> IResult<&[u8], InterfaceDescriptionBlock> {
    ng_block_parser::<InterfaceDescriptionBlock, PcapLE, _, _>()(i)
}

/// Parse an Interface Description Block (big-endian)
pub fn parse_interfacedescriptionblock_be(i: &[u8]) -> IResult<&[u8], InterfaceDescriptionBlock> {
    ng_block_parser::<InterfaceDescriptionBlock, PcapBE, _, _>()(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // ethernet interface, snaplen 65535, no options
    const IDB_LE: &[u8] = &hex!(
        "
01 00 00 00 14 00 00 00 01 00 00 00 FF FF 00 00
14 00 00 00"
    );

    // raw IPv4 interface with if_tsresol = 6 and if_tsoffset = 3
    const IDB_BE_OPTS: &[u8] = &hex!(
        "
00 00 00 01 00 00 00 2C 00 65 00 00 00 00 FF FF
00 09 00 01 06 00 00 00 00 0E 00 08 00 00 00 00
00 00 00 03 00 00 00 00 00 00 00 2C"
    );

    #[test]
    fn test_parse_idb_le() {
        let (rem, idb) = parse_interfacedescriptionblock_le(IDB_LE).expect("could not parse IDB");
        assert!(rem.is_empty());
        assert_eq!(idb.linktype, Linktype::ETHERNET);
        assert_eq!(idb.snaplen, 0xffff);
        assert!(idb.options.is_empty());
        assert_eq!(idb.if_tsresol, None);
        assert_eq!(idb.ts_resolution(), Some(1_000_000_000));
        assert_eq!(idb.ts_offset(), 0);
    }

    #[test]
    fn test_parse_idb_be_options() {
        let (rem, idb) =
            parse_interfacedescriptionblock_be(IDB_BE_OPTS).expect("could not parse IDB");
        assert!(rem.is_empty());
        assert_eq!(idb.linktype, Linktype::RAW);
        assert_eq!(idb.options.len(), 3);
        assert_eq!(idb.ts_resolution(), Some(1_000_000));
        assert_eq!(idb.ts_offset(), 3);
    }
}
