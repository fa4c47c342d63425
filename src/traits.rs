use crate::capture::DecodedFrame;
use crate::error::CaptureError;

/// Streaming iterator over the frames of a capture
///
/// Implementors are based on a [`ByteCursor`](crate::ByteCursor), so memory usage is constant
/// and huge files can be decoded. The frame returned by `next_frame` borrows the internal buffer:
/// it must be dropped before the next call, which also consumes it.
///
/// Malformed records are handled inside the reader. A corrupt trailing block ends the stream
/// (`Ok(None)`) instead of failing; errors are only returned when the input cannot be read.
pub trait FrameReader {
    /// Get the next frame, or `None` once the capture is exhausted
    fn next_frame(&mut self) -> Result<Option<DecodedFrame<'_>>, CaptureError>;

    /// Absolute offset of the reader in the input
    fn position(&self) -> u64;

    /// Total input length, if known
    fn total_len(&self) -> Option<u64>;
}
