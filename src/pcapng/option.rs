use std::convert::TryFrom;

use nom::bytes::complete::take;
use nom::combinator::complete;
use nom::error::ParseError;
use nom::multi::many0;
use nom::IResult;
use rusticata_macros::{align32, newtype_enum};

use crate::endianness::{Endianness, PcapEndianness};

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
    IfTsresol = 9,
    IfTsoffset = 14,
}
}

/// A pcapng option (type-length-value), borrowed from the block content
#[derive(Debug)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    pub len: u16,
    /// Raw value, including the 32-bit alignment padding
    pub value: &'a [u8],
}

impl<'a> PcapNGOption<'a> {
    /// Return the option value, using the `len` field to limit it, or None if length is invalid
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        self.value.get(..usize::from(self.len))
    }

    /// Return the option value interpreted as a single byte
    pub fn as_u8(&self) -> Option<u8> {
        match self.as_bytes() {
            Some(&[b]) => Some(b),
            _ => None,
        }
    }

    /// Return the option value interpreted as i64 in the section byte order
    ///
    /// Option data length must be exactly 8 bytes
    pub fn as_i64(&self, endianness: Endianness) -> Option<i64> {
        let b = <[u8; 8]>::try_from(self.as_bytes()?).ok()?;
        Some(endianness.u64_from_bytes(b) as i64)
    }
}

pub(crate) fn parse_option<'i, En: PcapEndianness, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption<'i>, E> {
    let (i, code) = En::parse_u16(i)?;
    let (i, len) = En::parse_u16(i)?;
    let (i, value) = take(align32!(len as u32))(i)?;
    let option = PcapNGOption {
        code: OptionCode(code),
        len,
        value,
    };
    Ok((i, option))
}

/// Parse all options contained in `i`
///
/// Parsing stops at the first incomplete option; what was decoded before is kept.
pub(crate) fn parse_options<'i, En: PcapEndianness, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], Vec<PcapNGOption<'i>>, E> {
    many0(complete(parse_option::<En, E>))(i)
}
