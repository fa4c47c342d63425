use std::io::Read;

use log::{debug, trace, warn};
use nom::IResult;

use super::{
    parse_pcap_frame_be, parse_pcap_frame_le, LegacyPcapBlock, PcapHeader, PCAP_RECORD_HEADER_LEN,
};
use crate::capture::{DecodedFrame, Timestamp};
use crate::cursor::ByteCursor;
use crate::endianness::{array_ref4, Endianness};
use crate::error::CaptureError;
use crate::traits::FrameReader;

type LegacyParseFn = fn(&[u8]) -> IResult<&[u8], LegacyPcapBlock>;

/// Frame iterator over legacy pcap data (streaming version)
///
/// The global header must already have been consumed from the cursor (see
/// [`create_reader`](crate::create_reader)). Each call to `next_frame` returns one record, in
/// file order. Fewer than 16 bytes left is a clean end of capture; a record whose data is cut
/// by the end of input is returned with the bytes that exist (and its declared length), and
/// ends the capture.
pub struct LegacyFrameReader<R>
where
    R: Read,
{
    header: PcapHeader,
    cursor: ByteCursor<R>,
    parse: LegacyParseFn,
    max_record_len: usize,
    pending: usize,
    exhausted: bool,
}

impl<R> LegacyFrameReader<R>
where
    R: Read,
{
    pub fn new(header: PcapHeader, cursor: ByteCursor<R>, max_record_len: usize) -> Self {
        let parse = match header.endianness() {
            Endianness::Big => parse_pcap_frame_be,
            Endianness::Little => parse_pcap_frame_le,
        };
        LegacyFrameReader {
            header,
            cursor,
            parse,
            max_record_len,
            pending: 0,
            exhausted: false,
        }
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }
}

impl<R> FrameReader for LegacyFrameReader<R>
where
    R: Read,
{
    fn next_frame(&mut self) -> Result<Option<DecodedFrame<'_>>, CaptureError> {
        // release the previous frame
        self.cursor.consume(self.pending);
        self.pending = 0;
        if self.exhausted {
            return Ok(None);
        }
        if !self.cursor.fill_to(PCAP_RECORD_HEADER_LEN)? {
            let trailing = self.cursor.data().len();
            if trailing > 0 {
                debug!("pcap: ignoring {} trailing bytes", trailing);
            }
            self.exhausted = true;
            return Ok(None);
        }
        let caplen = self
            .header
            .endianness()
            .u32_from_bytes(array_ref4(self.cursor.data(), 8)) as usize;
        if caplen > self.max_record_len {
            warn!(
                "pcap: record at offset {} claims {} bytes, stopping",
                self.cursor.position(),
                caplen
            );
            self.exhausted = true;
            return Ok(None);
        }
        // never buffer more than the input holds
        let mut wanted = PCAP_RECORD_HEADER_LEN + caplen;
        if let Some(remaining) = self.cursor.remaining() {
            wanted = (wanted as u64).min(remaining) as usize;
        }
        let complete = self.cursor.fill_to(wanted)? && wanted == PCAP_RECORD_HEADER_LEN + caplen;
        let position = self.cursor.position();
        let (_, block) = match (self.parse)(self.cursor.data()) {
            Ok(r) => r,
            Err(e) => {
                warn!("pcap: invalid record at offset {}: {:?}", position, e);
                self.exhausted = true;
                return Ok(None);
            }
        };
        if !complete {
            warn!(
                "pcap: record at offset {} truncated ({} of {} bytes)",
                position,
                block.data.len(),
                caplen
            );
            self.exhausted = true;
        }
        self.pending = PCAP_RECORD_HEADER_LEN + block.data.len();
        let timestamp = Timestamp::from_parts(
            u64::from(block.ts_sec),
            u64::from(block.ts_frac),
            self.header.ts_units_per_sec(),
        );
        trace!(
            "pcap: record at offset {}, {} bytes, ts {}",
            position,
            block.data.len(),
            timestamp.as_nanos()
        );
        Ok(Some(DecodedFrame {
            timestamp,
            captured_len: block.caplen,
            linktype: self.header.network,
            data: block.data,
        }))
    }

    fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn total_len(&self) -> Option<u64> {
        self.cursor.total_len()
    }
}
