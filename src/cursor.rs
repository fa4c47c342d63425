use std::io::{self, Read};

use circular::Buffer;

use crate::endianness::Endianness;

/// Sequential, bounds-checked reader over a byte stream
///
/// The cursor wraps any input providing the `Read` trait in a circular buffer, so memory usage
/// stays constant for huge files. Parsers ask for a number of bytes with [`fill_to`], parse the
/// slice returned by [`data`] and then [`consume`] what they used.
///
/// When the total input length is known (file metadata, in-memory slice), it is used to reject
/// lengths pointing past the end of input without trying to buffer them.
///
/// Positions are absolute offsets from the start of the input. Seeking is forward-only: consumed
/// data is discarded from the buffer.
///
/// The frame readers only use the buffered interface. Callers walking a format themselves can
/// use the consuming reads ([`read_u16`], [`read_u32`], [`read_u64`], [`read_array`]) together
/// with [`skip`], [`seek`] and [`is_eof`]:
///
/// ```
/// use pcap_sessions::{ByteCursor, Endianness};
///
/// // pcapng block header: type, then length
/// let bytes = [0x0a, 0x0d, 0x0d, 0x0a, 0x1c, 0x00, 0x00, 0x00, 0xff, 0xff];
/// let mut cursor = ByteCursor::new(64, &bytes[..], Some(bytes.len() as u64));
/// assert_eq!(cursor.read_u32(Endianness::Big)?, Some(0x0a0d_0d0a));
/// assert_eq!(cursor.read_u32(Endianness::Little)?, Some(28));
/// assert!(cursor.seek(10)?);
/// assert!(cursor.is_eof()?);
/// # Ok::<(), std::io::Error>(())
/// ```
///
/// [`read_u16`]: ByteCursor::read_u16
/// [`read_u32`]: ByteCursor::read_u32
/// [`read_u64`]: ByteCursor::read_u64
/// [`read_array`]: ByteCursor::read_array
/// [`skip`]: ByteCursor::skip
/// [`seek`]: ByteCursor::seek
/// [`is_eof`]: ByteCursor::is_eof
/// [`fill_to`]: ByteCursor::fill_to
/// [`data`]: ByteCursor::data
/// [`consume`]: ByteCursor::consume
pub struct ByteCursor<R>
where
    R: Read,
{
    reader: R,
    buffer: Buffer,
    consumed: u64,
    total_len: Option<u64>,
    reader_exhausted: bool,
}

impl<R> ByteCursor<R>
where
    R: Read,
{
    /// Creates a new `ByteCursor<R>` with the provided buffer capacity.
    pub fn new(capacity: usize, reader: R, total_len: Option<u64>) -> ByteCursor<R> {
        ByteCursor {
            reader,
            buffer: Buffer::with_capacity(capacity.max(16)),
            consumed: 0,
            total_len,
            reader_exhausted: false,
        }
    }

    /// Absolute offset of the next unread byte
    #[inline]
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Total input length, if known
    #[inline]
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Number of bytes left after the current position, if the input length is known
    pub fn remaining(&self) -> Option<u64> {
        self.total_len.map(|t| t.saturating_sub(self.consumed))
    }

    /// Current buffer capacity, in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns a slice with all the buffered, unconsumed data
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.buffer.data()
    }

    /// Make sure at least `n` bytes are buffered
    ///
    /// Returns `Ok(false)` if the input ends before `n` bytes are available. In that case, all
    /// remaining bytes are buffered and can still be read with [`data`](ByteCursor::data).
    pub fn fill_to(&mut self, n: usize) -> io::Result<bool> {
        if self.buffer.available_data() >= n {
            return Ok(true);
        }
        if n > self.buffer.capacity() {
            self.buffer.grow(n);
        }
        while self.buffer.available_data() < n {
            if self.reader_exhausted {
                return Ok(false);
            }
            self.refill()?;
        }
        Ok(true)
    }

    /// Consume data, and shift buffer if needed.
    ///
    /// `count` must not exceed the buffered data length.
    pub fn consume(&mut self, count: usize) {
        let count = self.buffer.consume(count);
        self.consumed += count as u64;
    }

    /// Skip `count` bytes, reading through the input if they are not buffered
    ///
    /// Returns `Ok(false)` if the input ended first (everything is then consumed).
    pub fn skip(&mut self, mut count: u64) -> io::Result<bool> {
        while count > 0 {
            if self.buffer.available_data() == 0 {
                if self.reader_exhausted {
                    return Ok(false);
                }
                self.refill()?;
                continue;
            }
            let n = count.min(self.buffer.available_data() as u64) as usize;
            self.consume(n);
            count -= n as u64;
        }
        Ok(true)
    }

    /// Move to the absolute offset `pos`
    ///
    /// Only forward moves are possible; returns `Ok(false)` if the input ends before `pos`.
    pub fn seek(&mut self, pos: u64) -> io::Result<bool> {
        if pos < self.consumed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot seek back to offset {} (current offset {})",
                    pos, self.consumed
                ),
            ));
        }
        self.skip(pos - self.consumed)
    }

    /// Returns true if there is no more data to read
    pub fn is_eof(&mut self) -> io::Result<bool> {
        self.fill_to(1).map(|available| !available)
    }

    /// Read `N` bytes, or `None` at end of input
    pub fn read_array<const N: usize>(&mut self) -> io::Result<Option<[u8; N]>> {
        if !self.fill_to(N)? {
            return Ok(None);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer.data()[..N]);
        self.consume(N);
        Ok(Some(out))
    }

    /// Read a `u16` in the given byte order, or `None` at end of input
    pub fn read_u16(&mut self, endianness: Endianness) -> io::Result<Option<u16>> {
        Ok(self.read_array::<2>()?.map(|b| endianness.u16_from_bytes(b)))
    }

    pub fn read_u32(&mut self, endianness: Endianness) -> io::Result<Option<u32>> {
        Ok(self.read_array::<4>()?.map(|b| endianness.u32_from_bytes(b)))
    }

    pub fn read_u64(&mut self, endianness: Endianness) -> io::Result<Option<u64>> {
        Ok(self.read_array::<8>()?.map(|b| endianness.u64_from_bytes(b)))
    }

    fn refill(&mut self) -> io::Result<()> {
        self.buffer.shift();
        let space = self.buffer.space();
        // check if available space is empty, so we can distinguish
        // a read() returning 0 because of EOF or because we requested 0
        if space.is_empty() {
            return Ok(());
        }
        let sz = loop {
            match self.reader.read(space) {
                Ok(sz) => break sz,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }
}
