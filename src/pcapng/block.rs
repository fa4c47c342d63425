use nom::bytes::complete::take;
use nom::error::{ErrorKind, ParseError};
use nom::{Err, IResult};

use crate::endianness::PcapEndianness;

/// Size of the generic block header (type and length), in bytes
pub const BLOCK_HEADER_LEN: usize = 8;

/// Parser for the content of one block type
///
/// The generic layout (type, leading length, trailing length) is handled by
/// [`ng_block_parser`]; implementors only decode the content in between.
pub(crate) trait PcapNGBlockParser<'a, En: PcapEndianness, O: 'a> {
    /// Minimum header size, in bytes
    const HDR_SZ: usize;
    /// Magic number for this block type
    const MAGIC: u32;

    // caller function must have tested header type(magic) and length
    fn inner_parse<E: ParseError<&'a [u8]>>(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], O, E>;
}

/// Create a block parser function, given the parameters (block object and endianness)
///
/// The input must contain the complete block. The trailing length is passed to the content
/// parser but not verified here: a mismatch is a recoverable anomaly, since the leading length
/// already delimits the block.
pub(crate) fn ng_block_parser<'a, P, En, O, E>() -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], O, E>
where
    P: PcapNGBlockParser<'a, En, O>,
    En: PcapEndianness,
    O: 'a,
    E: ParseError<&'a [u8]>,
{
    move |i: &'a [u8]| {
        // read generic block layout
        //
        let (i, block_type) = En::parse_u32(i)?;
        let (i, block_len1) = En::parse_u32(i)?;
        if (block_len1 as usize) < P::HDR_SZ {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        if block_type != P::MAGIC {
            return Err(Err::Error(E::from_error_kind(i, ErrorKind::Verify)));
        }
        // 12 is block_type (4) + block_len1 (4) + block_len2 (4)
        let (i, block_content) = take(block_len1 - 12)(i)?;
        let (i, block_len2) = En::parse_u32(i)?;
        // call block content parsing function
        let (_, b) = P::inner_parse(block_type, block_len1, block_content, block_len2)?;
        // return the remaining bytes from the container, not content
        Ok((i, b))
    }
}
