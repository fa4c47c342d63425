//! Capture format detection
//!
//! The first 4 bytes of a capture select the container: one of the legacy pcap magic numbers
//! (which also give byte order and timestamp precision), or the pcapng Section Header Block type.
//! For pcapng, the byte order is given by the byte-order magic of the section header.
//!
//! The leading header is consumed here, and a [`FrameReader`] positioned on the first record or
//! block is returned with the capture metadata.

use std::io::Read;

use log::{debug, warn};

use crate::capture::{CaptureFormat, CaptureMetadata};
use crate::config::ParserConfig;
use crate::cursor::ByteCursor;
use crate::endianness::array_ref4;
use crate::error::CaptureError;
use crate::pcap::{is_pcap_magic, parse_pcap_header, LegacyFrameReader, PCAP_HEADER_LEN};
use crate::pcapng::{
    parse_sectionheaderblock, section_endianness, BlockFrameReader, SHB_MAGIC, SHB_MIN_LEN,
};
use crate::traits::FrameReader;

/// Detect the capture format of `reader` and build the matching frame reader
///
/// `total_len` is the input size, if known. It is used to reject lengths pointing past the
/// end of input.
///
/// # Errors
///
/// - [`CaptureError::UnrecognizedFormat`] if fewer than 4 bytes are available or the magic is
///   unknown,
/// - [`CaptureError::CorruptContainer`] if the leading header is truncated or invalid,
/// - [`CaptureError::Io`] on read failure.
pub fn create_reader<'r, R>(
    config: &ParserConfig,
    reader: R,
    total_len: Option<u64>,
) -> Result<(CaptureMetadata, Box<dyn FrameReader + 'r>), CaptureError>
where
    R: Read + 'r,
{
    let mut cursor = ByteCursor::new(config.buffer_capacity, reader, total_len);
    if !cursor.fill_to(4)? {
        return Err(CaptureError::UnrecognizedFormat {
            magic: cursor.data().to_vec(),
        });
    }
    let magic = array_ref4(cursor.data(), 0);
    let magic_le = u32::from_le_bytes(magic);
    if is_pcap_magic(magic_le) {
        create_legacy_reader(config, cursor)
    } else if magic_le == SHB_MAGIC {
        create_block_reader(config, cursor)
    } else {
        Err(CaptureError::UnrecognizedFormat {
            magic: magic.to_vec(),
        })
    }
}

fn create_legacy_reader<'r, R>(
    config: &ParserConfig,
    mut cursor: ByteCursor<R>,
) -> Result<(CaptureMetadata, Box<dyn FrameReader + 'r>), CaptureError>
where
    R: Read + 'r,
{
    if !cursor.fill_to(PCAP_HEADER_LEN)? {
        return Err(CaptureError::corrupt(format!(
            "pcap global header truncated ({} of {} bytes)",
            cursor.data().len(),
            PCAP_HEADER_LEN
        )));
    }
    let header = match parse_pcap_header(cursor.data()) {
        Ok((_, header)) => header,
        Err(e) => {
            return Err(CaptureError::corrupt(format!(
                "invalid pcap global header: {:?}",
                e
            )))
        }
    };
    cursor.consume(PCAP_HEADER_LEN);
    let mut meta = CaptureMetadata::new(CaptureFormat::Legacy, header.endianness());
    meta.linktype = Some(header.network);
    meta.nanosecond_precision = header.is_nanosecond_precision();
    meta.version_major = header.version_major;
    meta.version_minor = header.version_minor;
    debug!(
        "pcap {}.{}, {:?}, linktype {}, {} timestamps",
        header.version_major,
        header.version_minor,
        meta.endianness,
        header.network,
        if meta.nanosecond_precision { "ns" } else { "us" }
    );
    let reader = LegacyFrameReader::new(header, cursor, config.max_block_len);
    Ok((meta, Box::new(reader)))
}

fn create_block_reader<'r, R>(
    config: &ParserConfig,
    mut cursor: ByteCursor<R>,
) -> Result<(CaptureMetadata, Box<dyn FrameReader + 'r>), CaptureError>
where
    R: Read + 'r,
{
    cursor.fill_to(12)?;
    let endianness = section_endianness(cursor.data())
        .ok_or_else(|| CaptureError::corrupt("section header byte-order magic not recognized"))?;
    let block_len = endianness.u32_from_bytes(array_ref4(cursor.data(), 4)) as usize;
    if block_len < SHB_MIN_LEN {
        return Err(CaptureError::corrupt(format!(
            "section header length {} below minimum {}",
            block_len, SHB_MIN_LEN
        )));
    }
    if block_len > config.max_block_len
        || cursor.total_len().map_or(false, |t| block_len as u64 > t)
    {
        return Err(CaptureError::corrupt(format!(
            "section header length {} exceeds available data",
            block_len
        )));
    }
    if !cursor.fill_to(block_len)? {
        return Err(CaptureError::corrupt(format!(
            "section header truncated ({} of {} bytes)",
            cursor.data().len(),
            block_len
        )));
    }
    let shb = match parse_sectionheaderblock(&cursor.data()[..block_len]) {
        Ok((_, shb)) => shb,
        Err(e) => {
            return Err(CaptureError::corrupt(format!(
                "invalid section header: {:?}",
                e
            )))
        }
    };
    if !shb.lengths_match() {
        warn!(
            "pcapng: section header trailing length {} != {}, resuming at offset {}",
            shb.block_len2, shb.block_len1, block_len
        );
    }
    cursor.consume(block_len);
    let mut meta = CaptureMetadata::new(CaptureFormat::BlockBased, endianness);
    meta.version_major = shb.major_version;
    meta.version_minor = shb.minor_version;
    debug!(
        "pcapng {}.{}, {:?}",
        shb.major_version, shb.minor_version, endianness
    );
    let reader = BlockFrameReader::new(endianness, cursor, config.max_block_len);
    Ok((meta, Box::new(reader)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endianness::Endianness;
    use crate::linktype::Linktype;
    use crate::pcap::tests::{PCAP_HDR, PCAP_HDR_BE, PCAP_HDR_NSEC};
    use crate::pcapng::tests::{SHB_BE, SHB_LE};

    fn detect(input: &[u8]) -> Result<(CaptureMetadata, Box<dyn FrameReader + '_>), CaptureError> {
        create_reader(&ParserConfig::default(), input, Some(input.len() as u64))
    }

    #[test]
    fn legacy_variants() {
        let (meta, reader) = detect(PCAP_HDR).unwrap();
        assert_eq!(meta.format, CaptureFormat::Legacy);
        assert_eq!(meta.endianness, Endianness::Little);
        assert_eq!(meta.linktype, Some(Linktype::ETHERNET));
        assert!(!meta.nanosecond_precision);
        assert_eq!(reader.position(), 24);

        let (meta, _) = detect(PCAP_HDR_BE).unwrap();
        assert_eq!(meta.endianness, Endianness::Big);
        assert_eq!(meta.version_major, 2);

        let (meta, _) = detect(PCAP_HDR_NSEC).unwrap();
        assert!(meta.nanosecond_precision);
    }

    #[test]
    fn block_based_variants() {
        let (meta, reader) = detect(SHB_LE).unwrap();
        assert_eq!(meta.format, CaptureFormat::BlockBased);
        assert_eq!(meta.endianness, Endianness::Little);
        assert_eq!(meta.version_major, 1);
        assert_eq!(reader.position(), 28);

        let (meta, _) = detect(SHB_BE).unwrap();
        assert_eq!(meta.endianness, Endianness::Big);
    }

    #[test]
    fn unknown_magic_reports_bytes() {
        match detect(&[0xde, 0xad, 0xbe, 0xef, 0x00]) {
            Err(CaptureError::UnrecognizedFormat { magic }) => {
                assert_eq!(magic, vec![0xde, 0xad, 0xbe, 0xef])
            }
            _ => panic!("expected UnrecognizedFormat"),
        }
        match detect(&[0xd4, 0xc3]) {
            Err(CaptureError::UnrecognizedFormat { magic }) => assert_eq!(magic, vec![0xd4, 0xc3]),
            _ => panic!("expected UnrecognizedFormat"),
        }
    }

    #[test]
    fn truncated_legacy_header() {
        assert!(matches!(
            detect(&PCAP_HDR[..20]),
            Err(CaptureError::CorruptContainer(_))
        ));
    }

    #[test]
    fn corrupt_section_header() {
        let mut bad_bom = SHB_LE.to_vec();
        bad_bom[9] = 0;
        assert!(matches!(
            detect(&bad_bom),
            Err(CaptureError::CorruptContainer(_))
        ));

        let mut short = SHB_LE.to_vec();
        short[4] = 24;
        assert!(matches!(
            detect(&short),
            Err(CaptureError::CorruptContainer(_))
        ));

        let mut long = SHB_LE.to_vec();
        long[4] = 64;
        assert!(matches!(
            detect(&long),
            Err(CaptureError::CorruptContainer(_))
        ));
    }

    #[test]
    fn trailer_mismatch_is_tolerated() {
        let mut shb = SHB_LE.to_vec();
        shb[24] = 0x20;
        let (_, reader) = detect(&shb).unwrap();
        assert_eq!(reader.position(), 28);
    }
}
