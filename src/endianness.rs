use nom::error::ParseError;
use nom::number::complete::{be_u16, be_u32, le_u16, le_u32};
use nom::IResult;

/// Byte order of a capture (or of one pcapng section)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    #[inline]
    pub fn u16_from_bytes(self, b: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(b),
            Endianness::Big => u16::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u32_from_bytes(self, b: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(b),
            Endianness::Big => u32::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u64_from_bytes(self, b: [u8; 8]) -> u64 {
        match self {
            Endianness::Little => u64::from_le_bytes(b),
            Endianness::Big => u64::from_be_bytes(b),
        }
    }
}

pub(crate) struct PcapBE;
pub(crate) struct PcapLE;

/// Static byte order selection for the block parsers
pub(crate) trait PcapEndianness {
    const ENDIANNESS: Endianness;

    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E>;
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E>;

    fn u32_from_bytes(i: [u8; 4]) -> u32;
}

impl PcapEndianness for PcapBE {
    const ENDIANNESS: Endianness = Endianness::Big;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        be_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        be_u32(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_be_bytes(i)
    }
}

impl PcapEndianness for PcapLE {
    const ENDIANNESS: Endianness = Endianness::Little;

    #[inline]
    fn parse_u16<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u16, E> {
        le_u16(i)
    }

    #[inline]
    fn parse_u32<'a, E: ParseError<&'a [u8]>>(i: &'a [u8]) -> IResult<&'a [u8], u32, E> {
        le_u32(i)
    }

    #[inline]
    fn u32_from_bytes(i: [u8; 4]) -> u32 {
        u32::from_le_bytes(i)
    }
}

/// Return a reference to 4 bytes of `i`, starting at `offset`
///
/// Panics if `i` is too short; callers check lengths first.
#[inline]
pub(crate) fn array_ref4(i: &[u8], offset: usize) -> [u8; 4] {
    [i[offset], i[offset + 1], i[offset + 2], i[offset + 3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_and_static_orders_agree() {
        let b = [0x1a, 0x2b, 0x3c, 0x4d];
        assert_eq!(Endianness::Little.u32_from_bytes(b), PcapLE::u32_from_bytes(b));
        assert_eq!(Endianness::Big.u32_from_bytes(b), PcapBE::u32_from_bytes(b));
        assert_eq!(Endianness::Big.u32_from_bytes(b), 0x1a2b_3c4d);
        assert_eq!(PcapLE::ENDIANNESS, Endianness::Little);
    }

    #[test]
    fn parse_u16_consumes_two_bytes() {
        let (rem, v) = PcapBE::parse_u16::<nom::error::Error<&[u8]>>(&[0x08, 0x00, 0xff]).unwrap();
        assert_eq!(v, 0x0800);
        assert_eq!(rem, &[0xff]);
    }
}
