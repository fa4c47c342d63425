//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A legacy capture starts with a 24-byte global header, whose magic number gives the byte
//! order and the timestamp precision. It is followed by records, each made of a 16-byte header
//! and the captured packet data.
//!
//! [`LegacyFrameReader`] walks the records of a stream whose global header has already been
//! read by the container detector.

mod frame;
mod header;
mod reader;

pub use frame::*;
pub use header::*;
pub use reader::*;
