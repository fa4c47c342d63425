use std::io::Read;

use log::{debug, trace, warn};
use nom::IResult;

use super::*;
use crate::capture::DecodedFrame;
use crate::cursor::ByteCursor;
use crate::endianness::{array_ref4, Endianness};
use crate::error::CaptureError;
use crate::linktype::Linktype;
use crate::traits::FrameReader;

type EpbParseFn = fn(&[u8]) -> IResult<&[u8], EnhancedPacketBlock>;
type IdbParseFn = fn(&[u8]) -> IResult<&[u8], InterfaceDescriptionBlock>;

/// Per-interface decoding parameters, collected from Interface Description Blocks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    /// Timestamp units per second
    pub ts_resolution: u64,
    /// Seconds added to every timestamp
    pub ts_offset: i64,
}

impl Default for InterfaceInfo {
    /// Used for packets referring to an interface that was never described
    fn default() -> Self {
        InterfaceInfo {
            linktype: Linktype::ETHERNET,
            ts_resolution: DEFAULT_TS_RESOLUTION,
            ts_offset: 0,
        }
    }
}

impl<'a> From<&InterfaceDescriptionBlock<'a>> for InterfaceInfo {
    fn from(idb: &InterfaceDescriptionBlock<'a>) -> Self {
        let ts_resolution = idb.ts_resolution().unwrap_or_else(|| {
            warn!(
                "pcapng: invalid if_tsresol {:?}, assuming nanoseconds",
                idb.if_tsresol
            );
            DEFAULT_TS_RESOLUTION
        });
        InterfaceInfo {
            linktype: idb.linktype,
            ts_resolution,
            ts_offset: idb.ts_offset(),
        }
    }
}

/// Frame iterator over pcapng blocks (streaming version)
///
/// The first Section Header Block must already have been consumed from the cursor (see
/// [`create_reader`](crate::create_reader)); its byte order is given to [`BlockFrameReader::new`].
///
/// Enhanced Packet Blocks are returned as frames. Interface Description Blocks update the
/// interface table, a new Section Header Block switches byte order and resets the table, and
/// every other block is skipped using its declared length. A block whose length is smaller than
/// its header or points past the end of input ends the capture, and so does a block of type 0.
/// Blocks larger than the configured maximum are skipped without being buffered.
pub struct BlockFrameReader<R>
where
    R: Read,
{
    cursor: ByteCursor<R>,
    endianness: Endianness,
    parse_epb: EpbParseFn,
    parse_idb: IdbParseFn,
    interfaces: Vec<InterfaceInfo>,
    max_block_len: usize,
    pending: usize,
    exhausted: bool,
}

impl<R> BlockFrameReader<R>
where
    R: Read,
{
    pub fn new(endianness: Endianness, cursor: ByteCursor<R>, max_block_len: usize) -> Self {
        let mut reader = BlockFrameReader {
            cursor,
            endianness,
            parse_epb: parse_enhancedpacketblock_le,
            parse_idb: parse_interfacedescriptionblock_le,
            interfaces: Vec::new(),
            max_block_len,
            pending: 0,
            exhausted: false,
        };
        reader.set_endianness(endianness);
        reader
    }

    /// Byte order of the current section
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Interfaces described so far in the current section
    pub fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }

    fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
        match endianness {
            Endianness::Little => {
                self.parse_epb = parse_enhancedpacketblock_le;
                self.parse_idb = parse_interfacedescriptionblock_le;
            }
            Endianness::Big => {
                self.parse_epb = parse_enhancedpacketblock_be;
                self.parse_idb = parse_interfacedescriptionblock_be;
            }
        }
    }

    /// Buffer a complete block. Returns false if the input ends first.
    fn load_block(&mut self, block_len: usize, offset: u64) -> Result<bool, CaptureError> {
        if !self.cursor.fill_to(block_len)? {
            warn!(
                "pcapng: block at offset {} truncated ({} of {} bytes), stopping",
                offset,
                self.cursor.data().len(),
                block_len
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn read_section_header(&mut self, block_len: usize, offset: u64) {
        match parse_sectionheaderblock(&self.cursor.data()[..block_len]) {
            Ok((_, shb)) => {
                if !shb.lengths_match() {
                    warn!(
                        "pcapng: section header at offset {}: trailing length {} != {}",
                        offset, shb.block_len2, shb.block_len1
                    );
                }
                debug!(
                    "pcapng: new section at offset {}, version {}.{}, {:?}",
                    offset,
                    shb.major_version,
                    shb.minor_version,
                    shb.endianness()
                );
            }
            Err(e) => warn!("pcapng: invalid section header at offset {}: {:?}", offset, e),
        }
        self.interfaces.clear();
    }

    fn read_interface(&mut self, block_len: usize, offset: u64) {
        match (self.parse_idb)(&self.cursor.data()[..block_len]) {
            Ok((_, idb)) => {
                let info = InterfaceInfo::from(&idb);
                trace!(
                    "pcapng: interface {} at offset {}: {:?}",
                    self.interfaces.len(),
                    offset,
                    info
                );
                self.interfaces.push(info);
            }
            Err(e) => debug!(
                "pcapng: skipping invalid interface description at offset {}: {:?}",
                offset, e
            ),
        }
    }
}

impl<R> FrameReader for BlockFrameReader<R>
where
    R: Read,
{
    fn next_frame(&mut self) -> Result<Option<DecodedFrame<'_>>, CaptureError> {
        // release the previous frame
        self.cursor.consume(self.pending);
        self.pending = 0;
        while !self.exhausted {
            let offset = self.cursor.position();
            if !self.cursor.fill_to(BLOCK_HEADER_LEN)? {
                let trailing = self.cursor.data().len();
                if trailing > 0 {
                    debug!("pcapng: ignoring {} trailing bytes", trailing);
                }
                self.exhausted = true;
                break;
            }
            let block_type = self
                .endianness
                .u32_from_bytes(array_ref4(self.cursor.data(), 0));
            if block_type == END_MAGIC {
                debug!("pcapng: end of capture marker at offset {}", offset);
                self.exhausted = true;
                break;
            }
            if block_type == SHB_MAGIC {
                // the new section declares its own byte order
                self.cursor.fill_to(12)?;
                match section_endianness(self.cursor.data()) {
                    Some(e) => self.set_endianness(e),
                    None => {
                        warn!(
                            "pcapng: section header at offset {}: bad byte-order magic, stopping",
                            offset
                        );
                        self.exhausted = true;
                        break;
                    }
                }
            }
            let block_len = self
                .endianness
                .u32_from_bytes(array_ref4(self.cursor.data(), 4)) as usize;
            if block_len < BLOCK_HEADER_LEN {
                warn!(
                    "pcapng: block at offset {} has invalid length {}, stopping",
                    offset, block_len
                );
                self.exhausted = true;
                break;
            }
            if let Some(remaining) = self.cursor.remaining() {
                if block_len as u64 > remaining {
                    warn!(
                        "pcapng: block at offset {} claims {} bytes, only {} left, stopping",
                        offset, block_len, remaining
                    );
                    self.exhausted = true;
                    break;
                }
            }
            let buffered = matches!(block_type, EPB_MAGIC | IDB_MAGIC | SHB_MAGIC);
            if buffered && block_len > self.max_block_len {
                warn!(
                    "pcapng: block at offset {} claims {} bytes (limit {}), skipping",
                    offset, block_len, self.max_block_len
                );
                if block_type == SHB_MAGIC {
                    self.interfaces.clear();
                }
                if !self.cursor.skip(block_len as u64)? {
                    debug!("pcapng: input ended inside block at offset {}", offset);
                    self.exhausted = true;
                }
                continue;
            }
            match block_type {
                EPB_MAGIC => {
                    if !self.load_block(block_len, offset)? {
                        self.exhausted = true;
                        break;
                    }
                    let decoded = match (self.parse_epb)(&self.cursor.data()[..block_len]) {
                        Ok((_, epb)) => {
                            if epb.block_len1 != epb.block_len2 {
                                warn!(
                                    "pcapng: packet block at offset {}: trailing length {} != {}",
                                    offset, epb.block_len2, epb.block_len1
                                );
                            }
                            if epb.clamped() {
                                debug!(
                                    "pcapng: packet block at offset {}: caplen {} clamped to {}",
                                    offset, epb.caplen, epb.data.len()
                                );
                            }
                            let iface = match self.interfaces.get(epb.if_id as usize) {
                                Some(iface) => *iface,
                                None => {
                                    debug!(
                                        "pcapng: packet block at offset {}: unknown interface {}",
                                        offset, epb.if_id
                                    );
                                    InterfaceInfo::default()
                                }
                            };
                            let ts = epb.decode_ts(iface.ts_offset, iface.ts_resolution);
                            Some((ts, iface.linktype, epb.data.len(), epb.caplen))
                        }
                        Err(e) => {
                            debug!(
                                "pcapng: skipping invalid packet block at offset {}: {:?}",
                                offset, e
                            );
                            None
                        }
                    };
                    match decoded {
                        Some((timestamp, linktype, len, captured_len)) => {
                            self.pending = block_len;
                            trace!(
                                "pcapng: packet at offset {}, {} bytes, ts {}",
                                offset,
                                len,
                                timestamp.as_nanos()
                            );
                            let data =
                                &self.cursor.data()[EPB_DATA_OFFSET..EPB_DATA_OFFSET + len];
                            return Ok(Some(DecodedFrame {
                                timestamp,
                                captured_len,
                                linktype,
                                data,
                            }));
                        }
                        None => self.cursor.consume(block_len),
                    }
                }
                IDB_MAGIC => {
                    if !self.load_block(block_len, offset)? {
                        self.exhausted = true;
                        break;
                    }
                    self.read_interface(block_len, offset);
                    self.cursor.consume(block_len);
                }
                SHB_MAGIC => {
                    if !self.load_block(block_len, offset)? {
                        self.exhausted = true;
                        break;
                    }
                    self.read_section_header(block_len, offset);
                    self.cursor.consume(block_len);
                }
                _ => {
                    trace!(
                        "pcapng: skipping block type 0x{:x} at offset {} ({} bytes)",
                        block_type,
                        offset,
                        block_len
                    );
                    if !self.cursor.skip(block_len as u64)? {
                        debug!("pcapng: input ended inside block at offset {}", offset);
                        self.exhausted = true;
                    }
                }
            }
        }
        Ok(None)
    }

    fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn total_len(&self) -> Option<u64> {
        self.cursor.total_len()
    }
}
