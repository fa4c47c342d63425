use std::io;

use thiserror::Error;

/// Fatal errors of a capture parse
///
/// Anomalies inside individual frames or trailing blocks are never reported here: the decoders
/// skip them and keep going. Only problems that leave nothing to decode abort the parse.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The leading magic matches neither pcap nor pcapng
    #[error("unrecognized capture format (magic: {})", hex_bytes(.magic))]
    UnrecognizedFormat { magic: Vec<u8> },

    /// Byte order cannot be resolved, or the leading header is structurally invalid
    #[error("corrupt capture container: {0}")]
    CorruptContainer(String),

    /// The capture could not be opened or read
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl CaptureError {
    pub(crate) fn corrupt<S: Into<String>>(reason: S) -> Self {
        CaptureError::CorruptContainer(reason.into())
    }
}

fn hex_bytes(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect()
}
